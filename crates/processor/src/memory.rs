//! In-memory processor client for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::IntentId;

use crate::client::{IntentHandle, IntentState, IntentStatus, ProcessorClient, Refund};
use crate::error::{ProcessorError, Result};
use crate::webhook::{self, WebhookEvent};

#[derive(Debug)]
struct FakeIntent {
    amount: i64,
    currency: String,
    state: IntentState,
}

#[derive(Debug)]
struct InMemoryProcessorState {
    intents: HashMap<IntentId, FakeIntent>,
    next_id: u32,
    fail_on_create: bool,
    confirm_outcome: IntentState,
    refund_count: u32,
}

impl Default for InMemoryProcessorState {
    fn default() -> Self {
        Self {
            intents: HashMap::new(),
            next_id: 0,
            fail_on_create: false,
            confirm_outcome: IntentState::Succeeded,
            refund_count: 0,
        }
    }
}

/// In-memory stand-in for the payment gateway.
///
/// Provides the same interface as [`crate::StripeClient`] without any
/// network I/O, with switches to force failure modes.
#[derive(Debug, Clone)]
pub struct InMemoryProcessor {
    state: Arc<RwLock<InMemoryProcessorState>>,
    webhook_secret: String,
}

impl Default for InMemoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProcessor {
    /// Creates a processor with the default test webhook secret.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryProcessorState::default())),
            webhook_secret: "whsec_test".to_string(),
        }
    }

    /// Overrides the webhook signing secret.
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = secret.into();
        self
    }

    /// Configures the next create call to fail with a gateway rejection.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Sets the state confirm calls will report.
    pub fn set_confirm_outcome(&self, outcome: IntentState) {
        self.state.write().unwrap().confirm_outcome = outcome;
    }

    /// Returns the number of intents created so far.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns the number of refunds issued so far.
    pub fn refund_count(&self) -> u32 {
        self.state.read().unwrap().refund_count
    }

    /// Forces an intent into a given state, bypassing confirm.
    pub fn set_intent_state(&self, intent_id: &IntentId, state: IntentState) {
        if let Some(intent) = self.state.write().unwrap().intents.get_mut(intent_id) {
            intent.state = state;
        }
    }

    /// Signs a payload the way the gateway would, for webhook tests.
    pub fn sign(&self, payload: &[u8]) -> String {
        webhook::sign_payload(
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
            payload,
        )
    }

    fn status_of(intent_id: &IntentId, intent: &FakeIntent) -> IntentStatus {
        let next_action = matches!(intent.state, IntentState::RequiresAction).then(|| {
            serde_json::json!({"type": "use_stripe_sdk"})
        });
        IntentStatus {
            id: intent_id.clone(),
            state: intent.state.clone(),
            next_action,
            object: serde_json::json!({
                "id": intent_id.as_str(),
                "object": "payment_intent",
                "amount": intent.amount,
                "currency": intent.currency,
                "status": intent.state.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProcessorClient for InMemoryProcessor {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        payment_method: &str,
    ) -> Result<IntentHandle> {
        let _ = payment_method;
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(ProcessorError::Gateway {
                message: "Your card was declined.".to_string(),
            });
        }

        state.next_id += 1;
        let id = IntentId::new(format!("pi_{:04}", state.next_id));
        let client_secret = format!("{id}_secret_{:04}", state.next_id);
        state.intents.insert(
            id.clone(),
            FakeIntent {
                amount,
                currency: currency.to_string(),
                state: IntentState::RequiresConfirmation,
            },
        );

        Ok(IntentHandle { id, client_secret })
    }

    async fn confirm_intent(&self, intent_id: &IntentId) -> Result<IntentStatus> {
        let mut state = self.state.write().unwrap();
        let outcome = state.confirm_outcome.clone();
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.clone()))?;

        intent.state = outcome;
        Ok(Self::status_of(intent_id, intent))
    }

    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<IntentStatus> {
        let state = self.state.read().unwrap();
        let intent = state
            .intents
            .get(intent_id)
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.clone()))?;
        Ok(Self::status_of(intent_id, intent))
    }

    async fn create_refund(&self, intent_id: &IntentId) -> Result<Refund> {
        let mut state = self.state.write().unwrap();
        let intent = state
            .intents
            .get(intent_id)
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.clone()))?;

        let object = serde_json::json!({
            "id": format!("re_{:04}", state.refund_count + 1),
            "object": "refund",
            "payment_intent": intent_id.as_str(),
            "amount": intent.amount,
            "status": "succeeded",
        });
        state.refund_count += 1;

        Ok(Refund {
            id: object["id"].as_str().unwrap_or_default().to_string(),
            object,
        })
    }

    fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent> {
        webhook::verify(&self.webhook_secret, payload, signature_header)?;
        webhook::parse_event(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_confirm_succeeds() {
        let processor = InMemoryProcessor::new();

        let handle = processor.create_intent(1000, "usd", "pm_1").await.unwrap();
        assert_eq!(handle.id, IntentId::new("pi_0001"));
        assert_eq!(processor.intent_count(), 1);

        let status = processor.confirm_intent(&handle.id).await.unwrap();
        assert_eq!(status.state, IntentState::Succeeded);
        assert!(status.next_action.is_none());
    }

    #[tokio::test]
    async fn confirm_can_require_action() {
        let processor = InMemoryProcessor::new();
        processor.set_confirm_outcome(IntentState::RequiresAction);

        let handle = processor.create_intent(500, "usd", "pm_1").await.unwrap();
        let status = processor.confirm_intent(&handle.id).await.unwrap();

        assert_eq!(status.state, IntentState::RequiresAction);
        assert!(status.next_action.is_some());
    }

    #[tokio::test]
    async fn fail_on_create_surfaces_gateway_error() {
        let processor = InMemoryProcessor::new();
        processor.set_fail_on_create(true);

        let result = processor.create_intent(1000, "usd", "pm_1").await;
        assert!(matches!(result, Err(ProcessorError::Gateway { .. })));
        assert_eq!(processor.intent_count(), 0);
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let processor = InMemoryProcessor::new();
        let missing = IntentId::new("pi_missing");

        let result = processor.retrieve_intent(&missing).await;
        assert!(matches!(result, Err(ProcessorError::IntentNotFound(_))));

        let result = processor.confirm_intent(&missing).await;
        assert!(matches!(result, Err(ProcessorError::IntentNotFound(_))));
    }

    #[tokio::test]
    async fn refund_returns_gateway_object() {
        let processor = InMemoryProcessor::new();
        let handle = processor.create_intent(1000, "usd", "pm_1").await.unwrap();
        processor.confirm_intent(&handle.id).await.unwrap();

        let refund = processor.create_refund(&handle.id).await.unwrap();
        assert_eq!(refund.id, "re_0001");
        assert_eq!(refund.object["payment_intent"], "pi_0001");
        assert_eq!(processor.refund_count(), 1);
    }

    #[tokio::test]
    async fn signed_webhook_roundtrip() {
        let processor = InMemoryProcessor::new();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_0001"}}}"#;
        let header = processor.sign(payload);

        let event = processor
            .verify_webhook_signature(payload, &header)
            .unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.intent_id(), Some("pi_0001"));
    }
}
