//! Payment lifecycle orchestration.
//!
//! Coordinates the external payment gateway with the local record store:
//! create/confirm/refund operations on the synchronous path, and webhook
//! ingestion on the asynchronous path. Both paths keep the two sides in
//! sync under partial failure and apply status transitions idempotently.

pub mod error;
pub mod orchestrator;
pub mod webhook;

pub use error::{LifecycleError, Result};
pub use orchestrator::{ConfirmOutcome, CreatePayment, CreatedPayment, PaymentLifecycle};
pub use webhook::{PAYMENT_SUCCEEDED_EVENT, WebhookIngestor, WebhookOutcome};
