//! Order creation, lookup and the payment callback endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{CreateOrderRequest, Order, PaymentCallback};
use orders::{OrderLifecycle, PaymentInitiator};
use store::{CatalogStore, OrderStore};

use crate::error::ApiError;

/// Shared state of the order service's handlers.
///
/// The catalog handlers reach the store through the lifecycle, so both
/// surfaces always see the same rows.
pub struct OrderAppState<S, P>
where
    S: OrderStore + CatalogStore,
    P: PaymentInitiator,
{
    pub lifecycle: Arc<OrderLifecycle<S, P>>,
}

impl<S, P> OrderAppState<S, P>
where
    S: OrderStore + CatalogStore,
    P: PaymentInitiator,
{
    pub fn new(lifecycle: Arc<OrderLifecycle<S, P>>) -> Self {
        Self { lifecycle }
    }

    pub fn catalog(&self) -> &S {
        self.lifecycle.store()
    }
}

/// POST /order/create_order: reserve the product and place the order.
#[tracing::instrument(skip(state))]
pub async fn create<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let order = state.lifecycle.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /order/query_order/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let order = state.lifecycle.get_order(OrderId::new(id)).await?;
    Ok(Json(order))
}

/// POST /order/payment_callback: settle an order awaiting payment.
///
/// Answers 409 when the order is not in `AWAITPAYMENT`, which is how the
/// payment service learns its notification was not applied.
#[tracing::instrument(skip(state, callback), fields(order_id = %callback.order_id))]
pub async fn payment_callback<S, P>(
    State(state): State<Arc<OrderAppState<S, P>>>,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<Order>, ApiError>
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let order = state.lifecycle.apply_payment_callback(callback).await?;
    Ok(Json(order))
}
