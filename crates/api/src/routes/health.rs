//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::BoundedQueue;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_depth: usize,
    pub queue_capacity: usize,
}

/// GET /health: reports liveness and how full the service's queue is.
pub async fn check<T: Send + 'static>(
    State(queue): State<Arc<BoundedQueue<T>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        queue_depth: queue.len(),
        queue_capacity: queue.capacity(),
    })
}
