//! Startup re-admission of unfinished orders.

use std::sync::Arc;

use common::BoundedQueue;
use domain::{Order, OrderState};
use store::OrderStore;

use crate::error::Result;

/// Re-queues orders that were created or paid but never progressed, for
/// instance because the process stopped with them still in the queue.
///
/// Nothing is deduplicated against orders already in flight; the lifecycle
/// actions re-check the persisted state before writing.
pub struct RecoveryScanner<S: OrderStore> {
    store: S,
    queue: Arc<BoundedQueue<Order>>,
}

impl<S: OrderStore> RecoveryScanner<S> {
    pub fn new(store: S, queue: Arc<BoundedQueue<Order>>) -> Self {
        Self { store, queue }
    }

    /// Enqueues every order persisted as `Created` or `Paid` and returns how
    /// many were re-admitted.
    ///
    /// Blocks while the queue is full, so the dispatcher should already be
    /// consuming when this runs.
    #[tracing::instrument(skip(self))]
    pub async fn scan_pending_orders(&self) -> Result<usize> {
        let orders = self
            .store
            .find_orders_by_states(&OrderState::PENDING)
            .await?;
        let count = orders.len();

        for order in orders {
            tracing::debug!(order_id = %order.id, state = %order.state, "re-admitting order");
            self.queue.enqueue(order).await;
        }

        metrics::counter!("orders_recovered_total").increment(count as u64);
        tracing::info!(count, "pending orders re-admitted");
        Ok(count)
    }
}
