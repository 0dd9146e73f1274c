//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use orders::LifecycleError;
use payments::PaymentError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Order lifecycle error.
    Lifecycle(LifecycleError),
    /// Payment publish error.
    Payment(PaymentError),
    /// Store error from a catalog call.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
        };

        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn lifecycle_error_to_response(err: LifecycleError) -> (StatusCode, String) {
    match &err {
        LifecycleError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::Conflict { .. } | LifecycleError::ProductNotAvailable(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LifecycleError::OrderNotFound(_) | LifecycleError::CustomerNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        LifecycleError::Domain(OrderError::InvalidStateTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LifecycleError::Domain(OrderError::UnexpectedPaymentState(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        LifecycleError::PaymentInitiation(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        LifecycleError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::Notify(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        e if e.is_not_found() => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::ProductNotAvailable(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
