use common::IntentId;
use thiserror::Error;

/// Errors that can occur when interacting with the payment record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this intent id already exists.
    /// Intent ids are unique across all records once assigned.
    #[error("Payment record already exists for intent {0}")]
    DuplicateIntent(IntentId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
