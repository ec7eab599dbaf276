//! Webhook ingestion: asynchronous, out-of-band state sync.
//!
//! Converges local state even when the synchronous confirm operation was
//! never invoked by this service (e.g. the front end confirmed directly
//! with the gateway).

use common::IntentId;
use metrics::counter;
use processor::ProcessorClient;
use store::{PaymentStore, StatusUpdate};

use crate::error::Result;
use crate::orchestrator::PaymentLifecycle;

/// The only event type that drives a state change. All other types are
/// acknowledged without effect, so newly enabled gateway events never
/// break delivery.
pub const PAYMENT_SUCCEEDED_EVENT: &str = "payment_intent.succeeded";

/// What a webhook delivery did.
///
/// Every variant is acknowledged with success by the HTTP layer once the
/// signature verified; the gateway redelivers indefinitely otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A record transitioned `pending -> succeeded`.
    Applied { intent_id: IntentId },
    /// The record was already terminal; redelivery no-op.
    AlreadyApplied { intent_id: IntentId },
    /// No local record matches the event's intent id.
    NoMatchingRecord { intent_id: IntentId },
    /// The event type is not recognized; accepted without effect.
    Ignored { event_type: String },
}

/// Verifies and applies gateway webhook events.
#[derive(Clone)]
pub struct WebhookIngestor<P, S> {
    lifecycle: PaymentLifecycle<P, S>,
}

impl<P: ProcessorClient, S: PaymentStore> WebhookIngestor<P, S> {
    /// Creates an ingestor sharing the orchestrator's processor and store.
    pub fn new(lifecycle: PaymentLifecycle<P, S>) -> Self {
        Self { lifecycle }
    }

    /// Verifies and applies a raw webhook delivery.
    ///
    /// `raw_body` must be the unparsed request bytes; the signature covers
    /// them exactly. A failed signature check returns an error and touches
    /// no record.
    #[tracing::instrument(skip(self, raw_body, signature_header))]
    pub async fn handle(&self, raw_body: &[u8], signature_header: &str) -> Result<WebhookOutcome> {
        let event = self
            .lifecycle
            .processor()
            .verify_webhook_signature(raw_body, signature_header)?;

        counter!("payment_webhooks_total").increment(1);

        if event.event_type != PAYMENT_SUCCEEDED_EVENT {
            tracing::debug!(event_type = %event.event_type, "ignoring unrecognized webhook event");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        let Some(intent_id) = event.intent_id().map(IntentId::new) else {
            tracing::warn!(event_id = %event.id, "succeeded event carries no intent id");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        };

        let update = self.lifecycle.apply_succeeded(&intent_id).await?;
        Ok(match update {
            StatusUpdate::Applied => WebhookOutcome::Applied { intent_id },
            StatusUpdate::AlreadyTerminal => WebhookOutcome::AlreadyApplied { intent_id },
            StatusUpdate::NoRecord => WebhookOutcome::NoMatchingRecord { intent_id },
        })
    }
}
