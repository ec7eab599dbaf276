//! The payment store trait.

use async_trait::async_trait;
use common::IntentId;

use crate::error::Result;
use crate::record::{NewPayment, PaymentRecord};

/// Outcome of a conditional status transition.
///
/// Transitions are conditional on the record still being `pending`, so a
/// repeated or racing update is reported rather than erroring: applying
/// the same transition twice leaves the record in the same terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The record transitioned out of `pending`.
    Applied,
    /// The record was already in a terminal state; nothing changed.
    AlreadyTerminal,
    /// No record matches the intent id.
    NoRecord,
}

/// Trait for payment record persistence.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new record with status `pending`.
    ///
    /// Fails with [`crate::StoreError::DuplicateIntent`] if a record
    /// already carries this intent id.
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord>;

    /// Looks up a record by its processor intent id.
    async fn find_by_intent(&self, intent_id: &IntentId) -> Result<Option<PaymentRecord>>;

    /// Conditionally transitions `pending -> succeeded`.
    async fn mark_succeeded(&self, intent_id: &IntentId) -> Result<StatusUpdate>;

    /// Conditionally transitions `pending -> failed`.
    async fn mark_failed(&self, intent_id: &IntentId) -> Result<StatusUpdate>;
}
