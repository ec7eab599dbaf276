//! Processor client trait and the wire-level types it exchanges.

use async_trait::async_trait;
use common::IntentId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::webhook::WebhookEvent;

/// Handle returned by a successful intent creation.
///
/// The `client_secret` is opaque and single-use; it is returned to the
/// caller so the front end can complete authentication steps, and must
/// never appear in logs.
#[derive(Clone, Deserialize)]
pub struct IntentHandle {
    pub id: IntentId,
    pub client_secret: String,
}

impl std::fmt::Debug for IntentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentHandle")
            .field("id", &self.id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// Gateway-side state of a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentState {
    /// Payment completed on the gateway side.
    Succeeded,
    /// The customer must complete an additional authentication step.
    RequiresAction,
    /// Created but not yet confirmed.
    RequiresConfirmation,
    /// No usable payment method attached.
    RequiresPaymentMethod,
    /// Confirmation accepted, settlement in flight.
    Processing,
    /// Intent was canceled on the gateway side.
    Canceled,
    /// A state this client does not model.
    #[serde(untagged)]
    Unknown(String),
}

impl IntentState {
    /// Parses a gateway status string into a state variant.
    pub fn parse(s: &str) -> Self {
        match s {
            "succeeded" => IntentState::Succeeded,
            "requires_action" => IntentState::RequiresAction,
            "requires_confirmation" => IntentState::RequiresConfirmation,
            "requires_payment_method" => IntentState::RequiresPaymentMethod,
            "processing" => IntentState::Processing,
            "canceled" => IntentState::Canceled,
            other => IntentState::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for IntentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntentState::Succeeded => "succeeded",
            IntentState::RequiresAction => "requires_action",
            IntentState::RequiresConfirmation => "requires_confirmation",
            IntentState::RequiresPaymentMethod => "requires_payment_method",
            IntentState::Processing => "processing",
            IntentState::Canceled => "canceled",
            IntentState::Unknown(other) => other,
        };
        write!(f, "{s}")
    }
}

/// Snapshot of an intent as reported by the gateway.
#[derive(Debug, Clone)]
pub struct IntentStatus {
    pub id: IntentId,
    pub state: IntentState,
    /// Opaque next-action payload, present when `state` is `RequiresAction`.
    /// Relayed to the caller unchanged.
    pub next_action: Option<serde_json::Value>,
    /// The gateway's full representation of the intent, relayed verbatim
    /// in confirm responses.
    pub object: serde_json::Value,
}

/// A refund as returned by the gateway.
#[derive(Debug, Clone)]
pub struct Refund {
    pub id: String,
    /// The gateway's full refund object, returned to the caller verbatim.
    pub object: serde_json::Value,
}

/// Trait for payment gateway operations.
///
/// Holds no state beyond connection configuration; every call is a round
/// trip to the external service and may fail with a [`crate::ProcessorError`].
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    /// Creates a payment intent with confirmation deferred (two-phase:
    /// create now, confirm later).
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        payment_method: &str,
    ) -> Result<IntentHandle>;

    /// Confirms a previously created intent.
    async fn confirm_intent(&self, intent_id: &IntentId) -> Result<IntentStatus>;

    /// Retrieves the gateway's current view of an intent.
    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<IntentStatus>;

    /// Creates a refund against a succeeded intent.
    async fn create_refund(&self, intent_id: &IntentId) -> Result<Refund>;

    /// Verifies a signed webhook payload and parses the event.
    ///
    /// Must be called with the raw, unparsed request body; re-serialized
    /// JSON will not match the signature.
    fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str)
    -> Result<WebhookEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn ProcessorClient) {}
    }

    #[test]
    fn intent_state_parses_known_statuses() {
        assert_eq!(IntentState::parse("succeeded"), IntentState::Succeeded);
        assert_eq!(
            IntentState::parse("requires_action"),
            IntentState::RequiresAction
        );
        assert_eq!(IntentState::parse("canceled"), IntentState::Canceled);
    }

    #[test]
    fn intent_state_preserves_unknown_statuses() {
        let state = IntentState::parse("requires_capture");
        assert_eq!(state, IntentState::Unknown("requires_capture".to_string()));
        assert_eq!(state.to_string(), "requires_capture");
    }

    #[test]
    fn intent_handle_debug_redacts_client_secret() {
        let handle = IntentHandle {
            id: IntentId::new("pi_1"),
            client_secret: "pi_1_secret_abc".to_string(),
        };
        let debug = format!("{handle:?}");
        assert!(!debug.contains("secret_abc"));
        assert!(debug.contains("[redacted]"));
    }
}
