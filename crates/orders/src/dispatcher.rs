//! Consumer loop of the dispatch queue.

use std::sync::Arc;

use common::BoundedQueue;
use domain::{Order, OrderState};
use store::OrderStore;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::error::{LifecycleError, Result};
use crate::initiator::PaymentInitiator;
use crate::lifecycle::OrderLifecycle;

/// What the dispatcher does with an order in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchAction {
    /// `Created`: ask the payment service to charge it.
    InitiatePayment,
    /// `Paid`: mark it fulfilled.
    Fulfill,
}

impl DispatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchAction::InitiatePayment => "initiate_payment",
            DispatchAction::Fulfill => "fulfill",
        }
    }
}

impl std::fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters collected by one run of the dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Orders handed to a task.
    pub dispatched: u64,
    /// Orders with no action for their state.
    pub skipped: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl DispatchStats {
    fn record(&mut self, joined: std::result::Result<Result<Option<DispatchAction>>, JoinError>) {
        match joined {
            Ok(Ok(_)) => self.succeeded += 1,
            Ok(Err(_)) => self.failed += 1,
            Err(err) => {
                error!(error = %err, "dispatch task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Takes orders off the dispatch queue and runs the action their state
/// calls for, one task per order.
///
/// Without a cap every dequeued order gets its own task immediately. With
/// [`with_max_in_flight`](Self::with_max_in_flight) the loop waits for a
/// free slot before taking the next order.
pub struct Dispatcher<S, P>
where
    S: OrderStore,
    P: PaymentInitiator,
{
    lifecycle: Arc<OrderLifecycle<S, P>>,
    queue: Arc<BoundedQueue<Order>>,
    limiter: Option<Arc<Semaphore>>,
}

impl<S, P> Clone for Dispatcher<S, P>
where
    S: OrderStore,
    P: PaymentInitiator,
{
    fn clone(&self) -> Self {
        Self {
            lifecycle: Arc::clone(&self.lifecycle),
            queue: Arc::clone(&self.queue),
            limiter: self.limiter.clone(),
        }
    }
}

impl<S, P> Dispatcher<S, P>
where
    S: OrderStore + 'static,
    P: PaymentInitiator + 'static,
{
    /// Creates a dispatcher consuming the lifecycle's queue.
    pub fn new(lifecycle: Arc<OrderLifecycle<S, P>>) -> Self {
        let queue = Arc::clone(lifecycle.queue());
        Self {
            lifecycle,
            queue,
            limiter: None,
        }
    }

    /// Caps the number of orders processed concurrently.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    /// Picks the action for an order from its state.
    pub fn route(order: &Order) -> Option<DispatchAction> {
        match order.state {
            OrderState::Created => Some(DispatchAction::InitiatePayment),
            OrderState::Paid => Some(DispatchAction::Fulfill),
            _ => None,
        }
    }

    /// Runs the routed action for one order.
    ///
    /// Returns `Ok(None)` when the order's state has no action. Failures are
    /// logged here; conflicts mean another run already moved the order on.
    pub async fn dispatch(&self, order: Order) -> Result<Option<DispatchAction>> {
        let Some(action) = Self::route(&order) else {
            debug!(order_id = %order.id, state = %order.state, "no action for order state");
            return Ok(None);
        };

        metrics::counter!("orders_dispatched_total", "action" => action.as_str()).increment(1);
        let result = match action {
            DispatchAction::InitiatePayment => self.lifecycle.initiate_payment(&order).await,
            DispatchAction::Fulfill => self.lifecycle.fulfill_order(&order).await,
        };

        match result {
            Ok(()) => Ok(Some(action)),
            Err(err @ LifecycleError::Conflict { .. }) => {
                warn!(order_id = %order.id, %action, error = %err, "order already handled, skipping");
                Err(err)
            }
            Err(err) => {
                error!(order_id = %order.id, %action, error = %err, "dispatch failed");
                Err(err)
            }
        }
    }

    /// Consumes the queue until `shutdown` flips to true or its sender is
    /// dropped, then waits for every in-flight task.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let mut tasks = JoinSet::new();
        info!(capacity = self.queue.capacity(), "dispatcher started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let order = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    stats.record(joined);
                    continue;
                }
                order = self.queue.dequeue() => order,
            };
            metrics::gauge!("dispatch_queue_depth").set(self.queue.len() as f64);

            // An empty dequeue is ignored
            let Some(order) = order else {
                continue;
            };

            if Self::route(&order).is_none() {
                debug!(order_id = %order.id, state = %order.state, "skipping order");
                stats.skipped += 1;
                continue;
            }

            let permit = match &self.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };

            stats.dispatched += 1;
            let dispatcher = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                dispatcher.dispatch(order).await
            });
        }

        info!(in_flight = tasks.len(), "dispatcher stopping, waiting for in-flight orders");
        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }
        info!(?stats, "dispatcher stopped");
        stats
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, OrderId, ProductId};
    use domain::Money;
    use store::InMemoryStore;

    use super::*;
    use crate::initiator::InMemoryPaymentInitiator;

    fn order(state: OrderState) -> Order {
        let mut order = Order::created(
            OrderId::new(1),
            CustomerId::new(1),
            ProductId::new(1),
            Money::from_units(1),
        );
        order.state = state;
        order
    }

    #[test]
    fn routes_by_state() {
        type D = Dispatcher<InMemoryStore, InMemoryPaymentInitiator>;

        assert_eq!(
            D::route(&order(OrderState::Created)),
            Some(DispatchAction::InitiatePayment)
        );
        assert_eq!(D::route(&order(OrderState::Paid)), Some(DispatchAction::Fulfill));
        for state in [
            OrderState::AwaitPayment,
            OrderState::Fulfilled,
            OrderState::Failed,
            OrderState::Canceled,
        ] {
            assert_eq!(D::route(&order(state)), None, "{state}");
        }
    }

    #[test]
    fn action_labels() {
        assert_eq!(DispatchAction::InitiatePayment.to_string(), "initiate_payment");
        assert_eq!(DispatchAction::Fulfill.as_str(), "fulfill");
    }

    #[tokio::test]
    async fn run_returns_immediately_when_already_shut_down() {
        let lifecycle = Arc::new(OrderLifecycle::new(
            InMemoryStore::new(),
            InMemoryPaymentInitiator::new(),
            Arc::new(BoundedQueue::new(4)),
        ));
        let dispatcher = Dispatcher::new(lifecycle);
        let (_tx, rx) = watch::channel(true);

        let stats = dispatcher.run(rx).await;
        assert_eq!(stats, DispatchStats::default());
    }
}
