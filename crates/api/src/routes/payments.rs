//! Payment service intake.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use domain::PaymentRequest;
use payments::{OrderNotifier, PaymentProcessor, PaymentWorker};
use serde::Serialize;
use store::PaymentStore;

use crate::error::ApiError;

/// Shared state of the payment service's handlers.
pub struct PaymentAppState<S, P, N>
where
    S: PaymentStore,
    P: PaymentProcessor,
    N: OrderNotifier,
{
    pub worker: Arc<PaymentWorker<S, P, N>>,
}

#[derive(Debug, Serialize)]
pub struct PaymentAccepted {
    pub order_id: OrderId,
    pub queue_depth: usize,
}

/// POST /payment/new_payment: queue a payment request.
///
/// Answers 200 once the request is queued; the outcome arrives later
/// through the order service's callback.
#[tracing::instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn new_payment<S, P, N>(
    State(state): State<Arc<PaymentAppState<S, P, N>>>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentAccepted>), ApiError>
where
    S: PaymentStore + 'static,
    P: PaymentProcessor + 'static,
    N: OrderNotifier + 'static,
{
    state.worker.publish(request).await?;
    Ok((
        StatusCode::OK,
        Json(PaymentAccepted {
            order_id: request.order_id,
            queue_depth: state.worker.queue().len(),
        }),
    ))
}
