//! Shared identifier types used across the payment backend crates.

pub mod types;

pub use types::{IntentId, PaymentId, UserId};
