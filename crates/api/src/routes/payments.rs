//! Payment lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::{IntentId, UserId};
use lifecycle::{
    ConfirmOutcome, CreatePayment, LifecycleError, PaymentLifecycle, WebhookIngestor,
};
use processor::{ProcessorClient, ProcessorError};
use serde::{Deserialize, Serialize};
use store::PaymentStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<P: ProcessorClient, S: PaymentStore> {
    pub lifecycle: PaymentLifecycle<P, S>,
    pub webhooks: WebhookIngestor<P, S>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Accepted as a JSON number or a numeric string.
    pub amount: Option<serde_json::Value>,
    pub currency: Option<String>,
    pub user_id: Option<String>,
    pub payment_method_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub payment_intent_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub message: String,
    pub payment_intent: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiresActionResponse {
    pub error: String,
    pub next_action: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// -- Handlers --

/// POST /payments/create-payment-intent — create a two-phase payment.
#[tracing::instrument(skip(state, req))]
pub async fn create<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, ApiError>
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let created = state
        .lifecycle
        .create(CreatePayment {
            amount: coerce_amount(req.amount.as_ref()),
            currency: req.currency.unwrap_or_default(),
            user_id: UserId::new(req.user_id.unwrap_or_default()),
            payment_method: req.payment_method_id.unwrap_or_default(),
        })
        .await?;

    Ok(Json(CreatePaymentResponse {
        client_secret: created.client_secret,
        payment_intent_id: created.intent_id.to_string(),
    }))
}

/// POST /payments/confirm — confirm a created intent.
#[tracing::instrument(skip(state, req))]
pub async fn confirm<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Json(req): Json<IntentRequest>,
) -> Result<Response, ApiError>
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let intent_id = IntentId::new(req.payment_intent_id.unwrap_or_default());

    let outcome = state.lifecycle.confirm(&intent_id).await?;
    let response = match outcome {
        ConfirmOutcome::Confirmed { intent } => Json(ConfirmResponse {
            message: "Payment confirmed".to_string(),
            payment_intent: intent,
        })
        .into_response(),
        ConfirmOutcome::RequiresAction { next_action } => (
            StatusCode::BAD_REQUEST,
            Json(RequiresActionResponse {
                error: "Authentication required".to_string(),
                next_action,
            }),
        )
            .into_response(),
        ConfirmOutcome::NotConfirmed { status, intent } => Json(ConfirmResponse {
            message: format!("Payment not confirmed (status: {status})"),
            payment_intent: intent,
        })
        .into_response(),
    };

    Ok(response)
}

/// POST /payments/refund — refund a succeeded intent.
#[tracing::instrument(skip(state, req))]
pub async fn refund<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let intent_id = IntentId::new(req.payment_intent_id.unwrap_or_default());
    let refund = state.lifecycle.refund(&intent_id).await?;

    // The gateway's refund object is relayed verbatim
    Ok(Json(refund.object))
}

/// POST /payments/webhook — ingest a signed gateway event.
///
/// The body is taken as raw bytes: signature verification must see the
/// payload exactly as the gateway sent it. Signature failures get a
/// plain-text 400; once the signature verifies, the delivery is always
/// acknowledged so the gateway stops redelivering.
#[tracing::instrument(skip(state, headers, body))]
pub async fn webhook<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state.webhooks.handle(&body, signature).await {
        Ok(_) => Json(WebhookAck { received: true }).into_response(),
        Err(LifecycleError::Processor(
            err @ (ProcessorError::SignatureInvalid(_) | ProcessorError::InvalidResponse(_)),
        )) => (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn coerce_amount(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0),
        None => 0,
    }
}
