//! Payment gateway client.
//!
//! Sole point of contact with the external payment processor. Exposes the
//! [`ProcessorClient`] trait consumed by the lifecycle orchestrator, a live
//! Stripe-speaking implementation, and an in-memory double for tests.

pub mod client;
pub mod error;
pub mod memory;
pub mod stripe;
pub mod webhook;

pub use client::{IntentHandle, IntentState, IntentStatus, ProcessorClient, Refund};
pub use error::{ProcessorError, Result};
pub use memory::InMemoryProcessor;
pub use stripe::{StripeClient, StripeConfig};
pub use webhook::{WebhookEvent, sign_payload};
