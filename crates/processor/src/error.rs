use common::IntentId;
use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The gateway rejected the call. The message is relayed unchanged.
    #[error("{message}")]
    Gateway { message: String },

    /// Network-level failure reaching the gateway, including timeouts.
    /// The outcome of the remote call is unknown.
    #[error("Gateway unreachable: {0}")]
    Network(String),

    /// The gateway has no record of the referenced intent.
    #[error("PaymentIntent not found: {0}")]
    IntentNotFound(IntentId),

    /// A webhook payload failed its authenticity check.
    #[error("Webhook signature invalid: {0}")]
    SignatureInvalid(String),

    /// The gateway answered with a body this client could not interpret.
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl ProcessorError {
    /// Whether the failed call is safe to retry.
    ///
    /// Only network-class failures qualify; gateway rejections are
    /// deterministic, and a retried create risks duplicate intents.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessorError::Network(_))
    }
}

/// Result type for processor operations.
pub type Result<T> = std::result::Result<T, ProcessorError>;
