//! HTTP surfaces of the order and payment services.
//!
//! Each service is an axum router over its core crate, with structured
//! logging (tracing), Prometheus metrics and a health endpoint reporting
//! the depth of the service's queue.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::BoundedQueue;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::PaymentInitiator;
use payments::{OrderNotifier, PaymentProcessor};
use store::{CatalogStore, OrderStore, PaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::orders::OrderAppState;
pub use routes::payments::PaymentAppState;

/// Builds the order service router.
pub fn create_order_app<S, P>(
    state: Arc<OrderAppState<S, P>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + CatalogStore + 'static,
    P: PaymentInitiator + 'static,
{
    let queue = Arc::clone(state.lifecycle.queue());

    Router::new()
        .route(
            "/order/create_customer",
            post(routes::catalog::create_customers::<S, P>),
        )
        .route(
            "/order/query_customer/{id}",
            get(routes::catalog::get_customer::<S, P>),
        )
        .route(
            "/order/create_product",
            post(routes::catalog::create_products::<S, P>),
        )
        .route(
            "/order/query_product/{id}",
            get(routes::catalog::get_product::<S, P>),
        )
        .route("/order/create_order", post(routes::orders::create::<S, P>))
        .route("/order/query_order/{id}", get(routes::orders::get::<S, P>))
        .route(
            "/order/payment_callback",
            post(routes::orders::payment_callback::<S, P>),
        )
        .with_state(state)
        .merge(observability_router(queue, metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Builds the payment service router.
pub fn create_payment_app<S, P, N>(
    state: Arc<PaymentAppState<S, P, N>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: PaymentStore + 'static,
    P: PaymentProcessor + 'static,
    N: OrderNotifier + 'static,
{
    let queue = Arc::clone(state.worker.queue());

    Router::new()
        .route(
            "/payment/new_payment",
            post(routes::payments::new_payment::<S, P, N>),
        )
        .with_state(state)
        .merge(observability_router(queue, metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn observability_router<T: Send + 'static>(
    queue: Arc<BoundedQueue<T>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<T>))
        .with_state(queue)
        .merge(metrics_router)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
