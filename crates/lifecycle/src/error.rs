use common::IntentId;
use processor::{IntentState, ProcessorError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Caller input missing or malformed. No processor call was made and
    /// no record was created.
    #[error("{0}")]
    Validation(String),

    /// The payment gateway rejected or failed the call. The gateway's
    /// message is relayed unchanged.
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// The operation is not permitted given the intent's gateway state.
    #[error("Payment was not successful, so no refund is possible (status: {status})")]
    InvalidState { status: IntentState },

    /// Record store failure on a path with no external side effect.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The gateway call succeeded but the local write failed: the gateway
    /// holds an intent with no matching record. Surfaced distinctly for
    /// operational alerting; the intent id is needed to reconcile.
    #[error("Intent {intent_id} exists at the gateway but could not be recorded locally: {source}")]
    Unreconciled {
        intent_id: IntentId,
        source: StoreError,
    },
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
