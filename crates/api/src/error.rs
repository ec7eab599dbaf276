//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifecycle::LifecycleError;
use processor::ProcessorError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Lifecycle operation error.
    Lifecycle(LifecycleError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn lifecycle_error_to_response(err: LifecycleError) -> (StatusCode, String) {
    match &err {
        LifecycleError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::InvalidState { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::Processor(ProcessorError::IntentNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        LifecycleError::Processor(ProcessorError::SignatureInvalid(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        LifecycleError::Unreconciled { .. } => {
            // Reconciliation gap: the gateway holds state we failed to
            // record. Already logged at error level by the lifecycle.
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}
