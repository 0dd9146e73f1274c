//! Order service error types.

use common::{CustomerId, OrderId, ProductId};
use domain::{OrderError, OrderState};
use store::StoreError;
use thiserror::Error;

/// Failure of one payment initiation call.
#[derive(Debug, Error)]
pub enum InitiationError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The payment service answered with a non-success status.
    #[error("payment service returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The initiator refused the call (injected by the in-memory initiator).
    #[error("payment initiation unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The request is malformed; nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The persisted order is not in the state the operation requires.
    #[error("order {order_id} is {actual}, expected {expected}")]
    Conflict {
        order_id: OrderId,
        actual: OrderState,
        expected: OrderState,
    },

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("product not available: {0}")]
    ProductNotAvailable(ProductId),

    /// Both payment initiation attempts failed.
    #[error("Failed to call payment api: {0}")]
    PaymentInitiation(#[from] InitiationError),

    #[error("Domain error: {0}")]
    Domain(#[from] OrderError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => LifecycleError::OrderNotFound(id),
            StoreError::CustomerNotFound(id) => LifecycleError::CustomerNotFound(id),
            StoreError::ProductNotAvailable(id) | StoreError::ProductNotFound(id) => {
                LifecycleError::ProductNotAvailable(id)
            }
            other => LifecycleError::Store(other),
        }
    }
}

/// Convenience type alias for lifecycle results.
pub type Result<T> = std::result::Result<T, LifecycleError>;
