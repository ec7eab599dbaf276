use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{IntentId, PaymentId};
use tokio::sync::RwLock;

use crate::{
    NewPayment, PaymentRecord, PaymentStatus, Result, StoreError,
    store::{PaymentStore, StatusUpdate},
};

/// In-memory payment store implementation for testing.
///
/// This implementation keeps all records in memory and provides the same
/// interface and transition semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<IntentId, PaymentRecord>>>,
    fail_on_insert: Arc<AtomicBool>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures insert calls to fail as a lost database connection would.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    async fn transition(&self, intent_id: &IntentId, to: PaymentStatus) -> Result<StatusUpdate> {
        let mut records = self.records.write().await;
        match records.get_mut(intent_id) {
            None => Ok(StatusUpdate::NoRecord),
            Some(record) if record.status.is_terminal() => Ok(StatusUpdate::AlreadyTerminal),
            Some(record) => {
                record.status = to;
                Ok(StatusUpdate::Applied)
            }
        }
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord> {
        if self.fail_on_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        let mut records = self.records.write().await;

        if records.contains_key(&payment.intent_id) {
            return Err(StoreError::DuplicateIntent(payment.intent_id));
        }

        let record = PaymentRecord {
            id: PaymentId::new(),
            user_id: payment.user_id,
            amount: payment.amount,
            currency: payment.currency,
            intent_id: payment.intent_id.clone(),
            payment_method: payment.payment_method,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        records.insert(payment.intent_id, record.clone());
        Ok(record)
    }

    async fn find_by_intent(&self, intent_id: &IntentId) -> Result<Option<PaymentRecord>> {
        Ok(self.records.read().await.get(intent_id).cloned())
    }

    async fn mark_succeeded(&self, intent_id: &IntentId) -> Result<StatusUpdate> {
        self.transition(intent_id, PaymentStatus::Succeeded).await
    }

    async fn mark_failed(&self, intent_id: &IntentId) -> Result<StatusUpdate> {
        self.transition(intent_id, PaymentStatus::Failed).await
    }
}
