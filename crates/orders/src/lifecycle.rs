//! The order state machine and its persistence side effects.

use std::sync::Arc;

use common::{BoundedQueue, OrderId};
use domain::{
    CreateOrderRequest, Order, OrderError, OrderState, PaymentCallback, PaymentRequest,
    messages::INVALID_ORDER_ID,
};
use store::{OrderStore, OrderUpdate};
use tracing::{error, info, warn};

use crate::error::{InitiationError, LifecycleError, Result};
use crate::initiator::PaymentInitiator;

/// Failure reason recorded when payment initiation gives up.
pub const PAYMENT_INITIATION_FAILURE: &str = "Failed to call payment api";

/// First attempt plus one retry.
const INITIATION_ATTEMPTS: usize = 2;

/// Drives orders through their lifecycle.
///
/// Every write targets the order by id and re-checks the persisted state,
/// so the in-memory copy handed in by the dispatcher may be stale.
pub struct OrderLifecycle<S, P>
where
    S: OrderStore,
    P: PaymentInitiator,
{
    store: S,
    initiator: P,
    queue: Arc<BoundedQueue<Order>>,
}

impl<S, P> OrderLifecycle<S, P>
where
    S: OrderStore,
    P: PaymentInitiator,
{
    /// Creates a lifecycle writing to `store` and feeding `queue`.
    pub fn new(store: S, initiator: P, queue: Arc<BoundedQueue<Order>>) -> Self {
        Self {
            store,
            initiator,
            queue,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn queue(&self) -> &Arc<BoundedQueue<Order>> {
        &self.queue
    }

    /// Places an order and queues it for payment initiation.
    ///
    /// The customer check, the product reservation and the insert happen in
    /// one store transaction. The order is priced at the product's price.
    #[tracing::instrument(skip(self), fields(customer_id = %request.customer_id, product_id = %request.product_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        let problems = request.problems();
        if !problems.is_empty() {
            return Err(LifecycleError::Validation(problems.join("; ")));
        }

        let order = self
            .store
            .place_order(request.customer_id, request.product_id)
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        info!(order_id = %order.id, amount = %order.amount, state = %order.state, "order created");

        self.queue.enqueue(order.clone()).await;
        Ok(order)
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.store.find_order(order_id).await?)
    }

    /// Asks the payment service to charge an order, retrying once.
    ///
    /// The order is claimed with a guarded `Created -> AwaitPayment` write
    /// before the request goes out, so a callback that beats the response
    /// finds it awaiting payment. When both attempts fail the claim is
    /// rolled back to `Created` with the failure reason recorded.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn initiate_payment(&self, order: &Order) -> Result<()> {
        let current = self.store.find_order(order.id).await?;
        if !current.state.can_initiate_payment() {
            return Err(LifecycleError::Conflict {
                order_id: current.id,
                actual: current.state,
                expected: OrderState::Created,
            });
        }

        let claim = OrderUpdate::transition(OrderState::Created, OrderState::AwaitPayment)
            .clearing_fail_reason();
        if self.store.update_order(current.id, claim).await? == 0 {
            return Err(self.conflict(current.id, OrderState::Created).await);
        }

        let request = PaymentRequest::from(&current);
        if let Err(err) = self.call_with_retry(&request).await {
            metrics::counter!("payment_initiation_failures_total").increment(1);
            error!(error = %err, "payment initiation failed after retry");

            let release = OrderUpdate::transition(OrderState::AwaitPayment, OrderState::Created)
                .with_fail_reason(Some(PAYMENT_INITIATION_FAILURE.to_string()));
            if self.store.update_order(current.id, release).await? == 0 {
                warn!("order left awaiting payment, a callback already settled it");
            }
            return Err(err.into());
        }

        info!(state = %OrderState::AwaitPayment, "order awaiting payment");
        Ok(())
    }

    async fn call_with_retry(&self, request: &PaymentRequest) -> std::result::Result<(), InitiationError> {
        let mut attempt = 1;
        loop {
            metrics::counter!("payment_initiation_attempts_total").increment(1);
            match self.initiator.initiate(request).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < INITIATION_ATTEMPTS => {
                    warn!(attempt, error = %err, "payment initiation attempt failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Applies the payment service's verdict to an order.
    ///
    /// Only an order in `AwaitPayment` accepts it; anything else is a
    /// conflict and nothing is written. A paid order is queued for
    /// fulfillment.
    #[tracing::instrument(skip(self, callback), fields(order_id = %callback.order_id, payment_state = %callback.state()))]
    pub async fn apply_payment_callback(&self, callback: PaymentCallback) -> Result<Order> {
        if !callback.order_id.is_assigned() {
            return Err(LifecycleError::Validation(INVALID_ORDER_ID.to_string()));
        }
        if !callback.state().is_outcome() {
            return Err(LifecycleError::Validation(format!(
                "payment state {} does not settle an order",
                callback.state()
            )));
        }

        let order = self.store.find_order(callback.order_id).await?;
        let next = match order.state.after_payment(callback.state()) {
            Ok(next) => next,
            Err(OrderError::InvalidStateTransition { current_state, .. }) => {
                metrics::counter!("payment_callbacks_total", "outcome" => "conflict").increment(1);
                warn!(state = %current_state, "payment callback rejected");
                return Err(LifecycleError::Conflict {
                    order_id: order.id,
                    actual: current_state,
                    expected: OrderState::AwaitPayment,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut update = OrderUpdate::transition(OrderState::AwaitPayment, next);
        if next == OrderState::Failed {
            update = update.with_fail_reason(callback.result().map(str::to_owned));
        }
        if self.store.update_order(order.id, update.clone()).await? == 0 {
            metrics::counter!("payment_callbacks_total", "outcome" => "conflict").increment(1);
            return Err(self.conflict(order.id, OrderState::AwaitPayment).await);
        }

        // The guarded write matched, so the loaded row plus the update is
        // what is now persisted.
        let mut updated = order;
        update.apply(&mut updated);
        metrics::counter!("payment_callbacks_total", "outcome" => next.as_str()).increment(1);
        info!(state = %updated.state, "payment result applied");

        if updated.state == OrderState::Paid {
            self.queue.enqueue(updated.clone()).await;
        }
        Ok(updated)
    }

    /// Marks a paid order fulfilled.
    ///
    /// Guarded on `Paid`, so a second run for the same order is a conflict
    /// rather than a second fulfillment.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn fulfill_order(&self, order: &Order) -> Result<()> {
        let update = OrderUpdate::transition(OrderState::Paid, OrderState::Fulfilled);
        if self.store.update_order(order.id, update).await? == 0 {
            return Err(self.conflict(order.id, OrderState::Paid).await);
        }

        metrics::counter!("orders_fulfilled_total").increment(1);
        info!(state = %OrderState::Fulfilled, "order fulfilled");
        Ok(())
    }

    /// Builds the conflict error for a guarded write that matched no row.
    async fn conflict(&self, order_id: OrderId, expected: OrderState) -> LifecycleError {
        match self.store.find_order(order_id).await {
            Ok(order) => LifecycleError::Conflict {
                order_id,
                actual: order.state,
                expected,
            },
            Err(err) => err.into(),
        }
    }
}
