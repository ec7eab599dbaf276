//! HTTP API server with observability for the payment backend.
//!
//! Exposes the payment lifecycle operations over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use lifecycle::{PaymentLifecycle, WebhookIngestor};
use metrics_exporter_prometheus::PrometheusHandle;
use processor::ProcessorClient;
use store::PaymentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::payments::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P, S>(state: Arc<AppState<P, S>>, metrics_handle: PrometheusHandle) -> Router
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/payments/create-payment-intent",
            post(routes::payments::create::<P, S>),
        )
        .route("/payments/confirm", post(routes::payments::confirm::<P, S>))
        .route("/payments/refund", post(routes::payments::refund::<P, S>))
        .route("/payments/webhook", post(routes::payments::webhook::<P, S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over a processor and a store.
pub fn create_state<P, S>(processor: P, store: S) -> Arc<AppState<P, S>>
where
    P: ProcessorClient + Clone + 'static,
    S: PaymentStore + Clone + 'static,
{
    let lifecycle = PaymentLifecycle::new(processor, store);
    let webhooks = WebhookIngestor::new(lifecycle.clone());
    Arc::new(AppState {
        lifecycle,
        webhooks,
    })
}
