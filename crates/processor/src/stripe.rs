//! Stripe-backed processor client.
//!
//! Speaks the Stripe v1 REST API: form-encoded requests authenticated with
//! the secret key, JSON responses. Webhook signatures are checked with the
//! shared [`crate::webhook`] routines against the configured signing secret.

use std::time::Duration;

use async_trait::async_trait;
use common::IntentId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::client::{IntentHandle, IntentState, IntentStatus, ProcessorClient, Refund};
use crate::error::{ProcessorError, Result};
use crate::webhook::{self, WebhookEvent};

/// Bound on every gateway round trip. A timeout surfaces as
/// [`ProcessorError::Network`]: the remote outcome is unknown.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stripe connection configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`).
    api_key: SecretString,
    /// Webhook signing secret (`whsec_...`).
    webhook_secret: SecretString,
    /// API base URL, overridable for tests.
    api_base_url: String,
}

impl StripeConfig {
    /// Creates a configuration pointing at the live Stripe API.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Overrides the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Processor client backed by the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    config: StripeConfig,
    http: reqwest::Client,
}

/// Subset of Stripe's payment intent representation this client reads.
#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    status: String,
    client_secret: Option<String>,
    next_action: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StripeRefund {
    id: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Creates a client with a bounded-timeout HTTP transport.
    ///
    /// Panics if the TLS backend cannot be initialized; every request
    /// made through this client carries [`REQUEST_TIMEOUT`].
    pub fn new(config: StripeConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to initialize HTTP client");
        Self { config, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url)
    }

    /// Sends a request and maps gateway rejections to typed errors.
    ///
    /// A 404 becomes `IntentNotFound` when `intent_id` is supplied; any
    /// other non-success relays the gateway's error message unchanged.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        intent_id: Option<&IntentId>,
    ) -> Result<serde_json::Value> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ProcessorError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProcessorError::Network(e.to_string()))?;

        if status == reqwest::StatusCode::NOT_FOUND
            && let Some(id) = intent_id
        {
            return Err(ProcessorError::IntentNotFound(id.clone()));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("gateway returned HTTP {status}"));
            return Err(ProcessorError::Gateway { message });
        }

        serde_json::from_str(&body).map_err(|e| ProcessorError::InvalidResponse(e.to_string()))
    }

    fn parse_intent(object: serde_json::Value) -> Result<IntentStatus> {
        let intent: StripeIntent = serde_json::from_value(object.clone())
            .map_err(|e| ProcessorError::InvalidResponse(e.to_string()))?;
        Ok(IntentStatus {
            id: IntentId::new(intent.id),
            state: IntentState::parse(&intent.status),
            next_action: intent.next_action,
            object,
        })
    }
}

#[async_trait]
impl ProcessorClient for StripeClient {
    #[tracing::instrument(skip(self), fields(amount, currency))]
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        payment_method: &str,
    ) -> Result<IntentHandle> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("payment_method", payment_method.to_string()),
            // Two-phase: create now, confirm later. Leaves a window for
            // client-side authentication between create and confirm.
            ("confirmation_method", "manual".to_string()),
            ("confirm", "false".to_string()),
        ];

        let object = self
            .execute(
                self.http.post(self.url("/v1/payment_intents")).form(&params),
                None,
            )
            .await?;

        let intent: StripeIntent = serde_json::from_value(object)
            .map_err(|e| ProcessorError::InvalidResponse(e.to_string()))?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            ProcessorError::InvalidResponse("intent missing client_secret".to_string())
        })?;

        Ok(IntentHandle {
            id: IntentId::new(intent.id),
            client_secret,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn confirm_intent(&self, intent_id: &IntentId) -> Result<IntentStatus> {
        let object = self
            .execute(
                self.http
                    .post(self.url(&format!("/v1/payment_intents/{intent_id}/confirm"))),
                Some(intent_id),
            )
            .await?;
        Self::parse_intent(object)
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<IntentStatus> {
        let object = self
            .execute(
                self.http
                    .get(self.url(&format!("/v1/payment_intents/{intent_id}"))),
                Some(intent_id),
            )
            .await?;
        Self::parse_intent(object)
    }

    #[tracing::instrument(skip(self))]
    async fn create_refund(&self, intent_id: &IntentId) -> Result<Refund> {
        let params = [("payment_intent", intent_id.as_str())];
        let object = self
            .execute(
                self.http.post(self.url("/v1/refunds")).form(&params),
                Some(intent_id),
            )
            .await?;

        let refund: StripeRefund = serde_json::from_value(object.clone())
            .map_err(|e| ProcessorError::InvalidResponse(e.to_string()))?;
        Ok(Refund {
            id: refund.id,
            object,
        })
    }

    fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent> {
        webhook::verify(
            self.config.webhook_secret.expose_secret(),
            payload,
            signature_header,
        )?;
        webhook::parse_event(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::sign_payload;

    fn test_client() -> StripeClient {
        StripeClient::new(StripeConfig::new("sk_test_key", "whsec_test_secret"))
    }

    #[test]
    fn config_defaults_to_live_api() {
        let config = StripeConfig::new("sk_test", "whsec_test");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
    }

    #[test]
    fn config_base_url_override() {
        let config = StripeConfig::new("k", "s").with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn parse_intent_maps_status_and_next_action() {
        let object = serde_json::json!({
            "id": "pi_1",
            "status": "requires_action",
            "next_action": {"type": "use_stripe_sdk"}
        });
        let status = StripeClient::parse_intent(object).unwrap();
        assert_eq!(status.id, IntentId::new("pi_1"));
        assert_eq!(status.state, IntentState::RequiresAction);
        assert!(status.next_action.is_some());
    }

    #[test]
    fn verify_webhook_accepts_valid_signature() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = sign_payload("whsec_test_secret", chrono::Utc::now().timestamp(), payload);

        let event = client.verify_webhook_signature(payload, &header).unwrap();
        assert_eq!(event.intent_id(), Some("pi_1"));
    }

    #[test]
    fn verify_webhook_rejects_wrong_secret() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = sign_payload("whsec_wrong", chrono::Utc::now().timestamp(), payload);

        let err = client.verify_webhook_signature(payload, &header).unwrap_err();
        assert!(matches!(err, ProcessorError::SignatureInvalid(_)));
    }
}
