//! The lifecycle orchestrator: create, confirm and refund operations.

use common::{IntentId, UserId};
use metrics::counter;
use processor::{IntentState, ProcessorClient, Refund};
use store::{NewPayment, PaymentStore, StatusUpdate};

use crate::error::{LifecycleError, Result};

/// Input for the create operation.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub amount: i64,
    pub currency: String,
    pub user_id: UserId,
    pub payment_method: String,
}

/// Result of a successful create: what the caller needs to finish the
/// payment on the client side. The client secret is single-use and is
/// never logged.
#[derive(Debug, Clone)]
pub struct CreatedPayment {
    pub intent_id: IntentId,
    pub client_secret: String,
}

/// Outcome of a confirm operation.
///
/// `RequiresAction` is not a failure: the caller must complete an
/// authentication step and confirm again.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// The gateway confirmed the payment; the local record (if any) is
    /// now `succeeded`.
    Confirmed { intent: serde_json::Value },
    /// The customer must complete additional authentication; the local
    /// record stays `pending`.
    RequiresAction { next_action: Option<serde_json::Value> },
    /// The gateway reported a state that is neither success nor an
    /// authentication step; the local record is untouched unless the
    /// intent was canceled.
    NotConfirmed {
        status: IntentState,
        intent: serde_json::Value,
    },
}

/// The payment lifecycle orchestrator.
///
/// Owns no state of its own; every operation is a processor round trip
/// followed by a conditional store update. The processor and store are
/// injected so tests can substitute in-memory doubles.
#[derive(Clone)]
pub struct PaymentLifecycle<P, S> {
    processor: P,
    store: S,
}

impl<P: ProcessorClient, S: PaymentStore> PaymentLifecycle<P, S> {
    /// Creates an orchestrator over the given processor and store.
    pub fn new(processor: P, store: S) -> Self {
        Self { processor, store }
    }

    /// Returns a reference to the injected processor client.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Returns a reference to the injected record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a payment intent at the gateway and records it locally.
    ///
    /// Two-phase: the intent is created but not confirmed, preserving a
    /// window for client-side authentication between create and confirm.
    /// Validation runs before any external call; a gateway failure leaves
    /// nothing persisted.
    #[tracing::instrument(skip(self, payment), fields(user_id = %payment.user_id))]
    pub async fn create(&self, payment: CreatePayment) -> Result<CreatedPayment> {
        if payment.amount <= 0 {
            return Err(LifecycleError::Validation(
                "amount must be a positive integer".to_string(),
            ));
        }
        if payment.currency.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "currency is required".to_string(),
            ));
        }
        if payment.payment_method.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "paymentMethodId is required".to_string(),
            ));
        }

        let currency = payment.currency.to_lowercase();
        let handle = self
            .processor
            .create_intent(payment.amount, &currency, &payment.payment_method)
            .await?;

        let persisted = self
            .store
            .insert(NewPayment {
                user_id: payment.user_id,
                amount: payment.amount,
                currency,
                intent_id: handle.id.clone(),
                payment_method: payment.payment_method,
            })
            .await;

        if let Err(source) = persisted {
            // The gateway holds an intent we failed to record. Nothing can
            // be rolled back from here; flag it for reconciliation.
            tracing::error!(
                intent_id = %handle.id,
                error = %source,
                "intent created at gateway but local persist failed"
            );
            return Err(LifecycleError::Unreconciled {
                intent_id: handle.id,
                source,
            });
        }

        counter!("payments_created_total").increment(1);
        tracing::info!(intent_id = %handle.id, "payment intent created");

        Ok(CreatedPayment {
            intent_id: handle.id,
            client_secret: handle.client_secret,
        })
    }

    /// Confirms a previously created intent and syncs the local record.
    ///
    /// Idempotent with respect to the local record: a repeated confirm of
    /// a succeeded intent leaves the record `succeeded` without error.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, intent_id: &IntentId) -> Result<ConfirmOutcome> {
        if intent_id.is_empty() {
            return Err(LifecycleError::Validation(
                "paymentIntentId is required".to_string(),
            ));
        }

        let status = self.processor.confirm_intent(intent_id).await?;

        match status.state {
            IntentState::RequiresAction => Ok(ConfirmOutcome::RequiresAction {
                next_action: status.next_action,
            }),
            IntentState::Succeeded => {
                self.apply_succeeded(intent_id).await?;
                counter!("payments_confirmed_total").increment(1);
                Ok(ConfirmOutcome::Confirmed {
                    intent: status.object,
                })
            }
            IntentState::Canceled => {
                // The intent cannot proceed; close out the local record.
                self.store.mark_failed(intent_id).await?;
                Ok(ConfirmOutcome::NotConfirmed {
                    status: status.state,
                    intent: status.object,
                })
            }
            state => Ok(ConfirmOutcome::NotConfirmed {
                status: state,
                intent: status.object,
            }),
        }
    }

    /// Refunds a succeeded intent.
    ///
    /// The gateway is the source of truth for refund eligibility: the
    /// intent's current status is retrieved remotely rather than read
    /// from the local record, guarding against out-of-band reversals.
    /// The local record's status is not mutated by a refund.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, intent_id: &IntentId) -> Result<Refund> {
        if intent_id.is_empty() {
            return Err(LifecycleError::Validation(
                "paymentIntentId is required".to_string(),
            ));
        }

        let status = self.processor.retrieve_intent(intent_id).await?;
        if status.state != IntentState::Succeeded {
            return Err(LifecycleError::InvalidState {
                status: status.state,
            });
        }

        let refund = self.processor.create_refund(intent_id).await?;
        counter!("payments_refunded_total").increment(1);
        tracing::info!(intent_id = %intent_id, refund_id = %refund.id, "refund created");
        Ok(refund)
    }

    /// Applies the `pending -> succeeded` transition, logging the orphan
    /// case (gateway knows the intent, local store does not) instead of
    /// erroring. Create-on-confirm is deliberately not the policy here.
    pub(crate) async fn apply_succeeded(&self, intent_id: &IntentId) -> Result<StatusUpdate> {
        let update = self.store.mark_succeeded(intent_id).await?;
        match update {
            StatusUpdate::Applied => {
                tracing::info!(intent_id = %intent_id, "payment marked succeeded");
            }
            StatusUpdate::AlreadyTerminal => {
                tracing::debug!(intent_id = %intent_id, "payment already terminal, no-op");
            }
            StatusUpdate::NoRecord => {
                tracing::warn!(
                    intent_id = %intent_id,
                    "gateway reports intent succeeded but no local record matches"
                );
            }
        }
        Ok(update)
    }
}
