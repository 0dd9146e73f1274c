//! Payment queue consumer.

use std::sync::Arc;

use common::BoundedQueue;
use domain::{
    Payment, PaymentCallback, PaymentRequest, PaymentState,
    messages::{INVALID_AMOUNT, INVALID_ORDER_ID},
    payment::PAYMENT_SUCCEEDED,
};
use store::{NewPayment, PaymentStore, PaymentUpdate};
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::error::{PaymentError, Result};
use crate::notifier::OrderNotifier;
use crate::processor::PaymentProcessor;

/// Counters collected by one run of the worker loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests handed to a task.
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl WorkerStats {
    fn record(&mut self, joined: std::result::Result<Result<Payment>, JoinError>) {
        match joined {
            Ok(Ok(_)) => self.succeeded += 1,
            Ok(Err(_)) => self.failed += 1,
            Err(err) => {
                error!(error = %err, "payment task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Owns the payment queue and processes what lands in it.
pub struct PaymentWorker<S, P, N>
where
    S: PaymentStore,
    P: PaymentProcessor,
    N: OrderNotifier,
{
    store: S,
    processor: P,
    notifier: N,
    queue: Arc<BoundedQueue<PaymentRequest>>,
    limiter: Option<Arc<Semaphore>>,
}

impl<S, P, N> PaymentWorker<S, P, N>
where
    S: PaymentStore + 'static,
    P: PaymentProcessor + 'static,
    N: OrderNotifier + 'static,
{
    pub fn new(
        store: S,
        processor: P,
        notifier: N,
        queue: Arc<BoundedQueue<PaymentRequest>>,
    ) -> Self {
        Self {
            store,
            processor,
            notifier,
            queue,
            limiter: None,
        }
    }

    /// Caps the number of payments processed concurrently.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn queue(&self) -> &Arc<BoundedQueue<PaymentRequest>> {
        &self.queue
    }

    /// Validates a request and queues it, waiting while the queue is full.
    ///
    /// Every problem with the request is reported at once.
    pub async fn publish(&self, request: PaymentRequest) -> Result<()> {
        let problems = request.problems();
        if !problems.is_empty() {
            return Err(PaymentError::InvalidRequest(problems.join("; ")));
        }

        self.queue.enqueue(request).await;
        metrics::gauge!("payment_queue_depth").set(self.queue.len() as f64);
        debug!(order_id = %request.order_id, amount = %request.amount, "payment request queued");
        Ok(())
    }

    /// Processes one payment request end to end.
    ///
    /// Creates the payment row, runs the processor once, notifies the order
    /// service, then writes state, result and the notified flag in a single
    /// update. Every failure along the way is collected into the returned
    /// error.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn start_new_payment(&self, request: PaymentRequest) -> Result<Payment> {
        let mut problems = Vec::new();
        if !request.order_id.is_assigned() {
            problems.push(INVALID_ORDER_ID);
        }
        if request.amount.is_negative() {
            problems.push(INVALID_AMOUNT);
        }
        if !problems.is_empty() {
            return Err(PaymentError::InvalidRequest(problems.join("; ")));
        }

        let mut payment = self
            .store
            .create_payment(NewPayment {
                order_id: request.order_id,
                amount: request.amount,
            })
            .await?;

        let mut failures = Vec::new();
        let (state, result) = match self.processor.process(&request).await {
            Ok(()) => (PaymentState::Success, PAYMENT_SUCCEEDED.to_string()),
            Err(err) => {
                let text = err.to_string();
                failures.push(err);
                (PaymentState::Failed, text)
            }
        };
        info!(payment_id = %payment.id, %state, result = %result, "payment processed");

        let callback = PaymentCallback::new(request.order_id, state, Some(result.clone()));
        let notified = match self.notifier.notify(&callback).await {
            Ok(()) => true,
            Err(err) => {
                metrics::counter!("payment_notifications_failed_total").increment(1);
                error!(payment_id = %payment.id, error = %err, "order notification failed");
                failures.push(err.into());
                false
            }
        };

        let update = PaymentUpdate {
            state,
            result: Some(result),
            is_notified_order: notified,
        };
        match self.store.update_payment(payment.id, update.clone()).await {
            Ok(0) => failures.push(PaymentError::UpdateNotApplied(payment.id)),
            Ok(_) => update.apply(&mut payment),
            Err(err) => {
                error!(payment_id = %payment.id, error = %err, "payment update failed");
                failures.push(err.into());
            }
        }

        metrics::counter!("payments_processed_total", "state" => state.as_str()).increment(1);
        match PaymentError::from_failures(failures) {
            None => Ok(payment),
            Some(err) => Err(err),
        }
    }

    /// Consumes the queue until `shutdown` flips to true or its sender is
    /// dropped, then waits for every in-flight payment.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut tasks = JoinSet::new();
        info!(capacity = self.queue.capacity(), "payment worker started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let request = tokio::select! {
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
                request = self.queue.dequeue() => request,
            };
            metrics::gauge!("payment_queue_depth").set(self.queue.len() as f64);

            let Some(request) = request else {
                continue;
            };

            let permit = match &self.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };

            stats.processed += 1;
            let worker = Arc::clone(&self);
            tasks.spawn(async move {
                let _permit = permit;
                let result = worker.start_new_payment(request).await;
                if let Err(err) = &result {
                    error!(order_id = %request.order_id, error = %err, "payment pipeline failed");
                }
                result
            });
        }

        info!(in_flight = tasks.len(), "payment worker stopping, waiting for in-flight payments");
        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }
        info!(?stats, "payment worker stopped");
        stats
    }
}
