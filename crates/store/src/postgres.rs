use async_trait::async_trait;
use common::{IntentId, PaymentId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    NewPayment, PaymentRecord, PaymentStatus, Result, StoreError,
    store::{PaymentStore, StatusUpdate},
};

/// PostgreSQL-backed payment store implementation.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    /// Creates a new PostgreSQL payment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<PaymentRecord> {
        let status_raw: String = row.try_get("status")?;
        let status = PaymentStatus::parse(&status_raw).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown payment status: {status_raw}").into(),
            ))
        })?;

        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            intent_id: IntentId::new(row.try_get::<String, _>("intent_id")?),
            payment_method: row.try_get("payment_method")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Conditional transition out of `pending`.
    ///
    /// The `status = 'pending'` guard makes concurrent or repeated updates
    /// converge without flapping a terminal record.
    async fn transition(&self, intent_id: &IntentId, to: PaymentStatus) -> Result<StatusUpdate> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2
            WHERE intent_id = $1 AND status = 'pending'
            "#,
        )
        .bind(intent_id.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(StatusUpdate::Applied);
        }

        let existing: Option<String> =
            sqlx::query_scalar("SELECT status FROM payments WHERE intent_id = $1")
                .bind(intent_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match existing {
            None => StatusUpdate::NoRecord,
            Some(_) => StatusUpdate::AlreadyTerminal,
        })
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let record = PaymentRecord {
            id: PaymentId::new(),
            user_id: payment.user_id,
            amount: payment.amount,
            currency: payment.currency,
            intent_id: payment.intent_id,
            payment_method: payment.payment_method,
            status: PaymentStatus::Pending,
            created_at: chrono::Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, amount, currency, intent_id, payment_method, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.intent_id.as_str())
        .bind(&record.payment_method)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Unique constraint violation means the intent is already recorded
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("payments_intent_id_key")
            {
                return StoreError::DuplicateIntent(record.intent_id.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(record)
    }

    async fn find_by_intent(&self, intent_id: &IntentId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, amount, currency, intent_id, payment_method, status, created_at
            FROM payments
            WHERE intent_id = $1
            "#,
        )
        .bind(intent_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn mark_succeeded(&self, intent_id: &IntentId) -> Result<StatusUpdate> {
        self.transition(intent_id, PaymentStatus::Succeeded).await
    }

    async fn mark_failed(&self, intent_id: &IntentId) -> Result<StatusUpdate> {
        self.transition(intent_id, PaymentStatus::Failed).await
    }
}
