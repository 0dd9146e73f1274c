//! Integration tests for the dispatch loop driving the order lifecycle.

use std::sync::Arc;
use std::time::Duration;

use common::{BoundedQueue, CustomerId, OrderId, ProductId};
use domain::{
    CreateOrderRequest, Money, NewCustomer, NewProduct, Order, OrderState, PaymentCallback,
    PaymentState,
};
use orders::{
    DispatchStats, Dispatcher, InMemoryPaymentInitiator, OrderLifecycle, PAYMENT_INITIATION_FAILURE,
    RecoveryScanner,
};
use store::{CatalogStore, InMemoryStore, OrderStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type TestLifecycle = OrderLifecycle<InMemoryStore, InMemoryPaymentInitiator>;

struct TestHarness {
    lifecycle: Arc<TestLifecycle>,
    store: InMemoryStore,
    initiator: InMemoryPaymentInitiator,
    queue: Arc<BoundedQueue<Order>>,
}

impl TestHarness {
    async fn new(products: usize) -> Self {
        let store = InMemoryStore::new();
        store
            .create_customers(vec![NewCustomer::new("Ada")])
            .await
            .unwrap();
        let products = (0..products)
            .map(|i| NewProduct::new(format!("Product {i}"), Money::from_units(100)))
            .collect();
        store.create_products(products).await.unwrap();

        let initiator = InMemoryPaymentInitiator::new();
        let queue = Arc::new(BoundedQueue::new(64));
        let lifecycle = Arc::new(OrderLifecycle::new(
            store.clone(),
            initiator.clone(),
            Arc::clone(&queue),
        ));

        Self {
            lifecycle,
            store,
            initiator,
            queue,
        }
    }

    fn spawn_dispatcher(
        &self,
        dispatcher: Dispatcher<InMemoryStore, InMemoryPaymentInitiator>,
    ) -> (watch::Sender<bool>, JoinHandle<DispatchStats>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { dispatcher.run(rx).await });
        (tx, handle)
    }

    async fn create_order(&self, product: u64) -> Order {
        self.lifecycle
            .create_order(CreateOrderRequest::new(
                CustomerId::new(1),
                ProductId::new(product),
            ))
            .await
            .unwrap()
    }

    async fn wait_for(&self, id: OrderId, predicate: impl Fn(&Order) -> bool) -> Order {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let order = self.store.find_order(id).await.unwrap();
                if predicate(&order) {
                    return order;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("order did not reach the expected state in time")
    }
}

#[tokio::test]
async fn created_order_reaches_await_payment() {
    let h = TestHarness::new(1).await;
    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));

    let order = h.create_order(1).await;
    let order = h
        .wait_for(order.id, |o| o.state == OrderState::AwaitPayment)
        .await;

    assert!(order.fail_reason.is_none());
    assert_eq!(h.initiator.requests().len(), 1);
    assert_eq!(h.initiator.requests()[0].amount, Money::from_units(100));

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn paid_order_is_fulfilled_by_dispatcher() {
    let h = TestHarness::new(1).await;
    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));

    let order = h.create_order(1).await;
    h.wait_for(order.id, |o| o.state == OrderState::AwaitPayment)
        .await;

    h.lifecycle
        .apply_payment_callback(PaymentCallback::new(
            order.id,
            PaymentState::Success,
            Some("Succeed".to_string()),
        ))
        .await
        .unwrap();
    h.wait_for(order.id, |o| o.state == OrderState::Fulfilled)
        .await;

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn failed_initiation_leaves_order_created_with_reason() {
    let h = TestHarness::new(1).await;
    h.initiator.fail_next(2);
    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));

    let order = h.create_order(1).await;
    let order = h.wait_for(order.id, |o| o.fail_reason.is_some()).await;

    assert_eq!(order.state, OrderState::Created);
    assert_eq!(order.fail_reason.as_deref(), Some(PAYMENT_INITIATION_FAILURE));
    assert_eq!(h.initiator.attempts(), 2);

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn recovery_scan_feeds_the_dispatcher() {
    let h = TestHarness::new(3).await;
    for product in 1..=3 {
        h.create_order(product).await;
    }
    // Simulate a restart: the queued copies are lost
    while h.queue.try_dequeue().is_some() {}

    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));
    let scanner = RecoveryScanner::new(h.store.clone(), Arc::clone(&h.queue));
    assert_eq!(scanner.scan_pending_orders().await.unwrap(), 3);

    for id in 1..=3 {
        h.wait_for(OrderId::new(id), |o| o.state == OrderState::AwaitPayment)
            .await;
    }

    shutdown.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn duplicate_admission_does_not_fulfill_twice() {
    let h = TestHarness::new(1).await;
    let order = h.create_order(1).await;
    h.queue.try_dequeue();
    h.lifecycle.initiate_payment(&order).await.unwrap();
    let paid = h
        .lifecycle
        .apply_payment_callback(PaymentCallback::new(order.id, PaymentState::Success, None))
        .await
        .unwrap();
    // The callback already queued it once; queue it again as a recovery scan would
    h.queue.enqueue(paid).await;

    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));
    h.wait_for(order.id, |o| o.state == OrderState::Fulfilled)
        .await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn capped_dispatcher_processes_everything() {
    let h = TestHarness::new(10).await;
    let dispatcher = Dispatcher::new(Arc::clone(&h.lifecycle)).with_max_in_flight(2);
    let (shutdown, handle) = h.spawn_dispatcher(dispatcher);

    let mut ids = Vec::new();
    for product in 1..=10 {
        ids.push(h.create_order(product).await.id);
    }
    for id in ids {
        h.wait_for(id, |o| o.state == OrderState::AwaitPayment).await;
    }

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.dispatched, 10);
    assert_eq!(stats.succeeded, 10);
}

#[tokio::test]
async fn dropping_the_shutdown_sender_stops_the_loop() {
    let h = TestHarness::new(0).await;
    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));

    drop(shutdown);
    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats, DispatchStats::default());
}

#[tokio::test]
async fn orders_without_an_action_are_skipped_untouched() {
    let h = TestHarness::new(2).await;
    let awaiting = h.create_order(1).await;
    let failed = h.create_order(2).await;
    while h.queue.try_dequeue().is_some() {}

    h.lifecycle.initiate_payment(&awaiting).await.unwrap();
    h.lifecycle.initiate_payment(&failed).await.unwrap();
    h.lifecycle
        .apply_payment_callback(PaymentCallback::new(
            failed.id,
            PaymentState::Failed,
            Some("exceed payment limit".to_string()),
        ))
        .await
        .unwrap();

    let before = vec![
        h.store.find_order(awaiting.id).await.unwrap(),
        h.store.find_order(failed.id).await.unwrap(),
    ];
    assert_eq!(before[0].state, OrderState::AwaitPayment);
    assert_eq!(before[1].state, OrderState::Failed);
    for order in &before {
        h.queue.enqueue(order.clone()).await;
    }

    let (shutdown, handle) = h.spawn_dispatcher(Dispatcher::new(Arc::clone(&h.lifecycle)));
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.dispatched, 0);
    assert_eq!(stats.succeeded, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(h.initiator.attempts(), 2);

    let after = vec![
        h.store.find_order(awaiting.id).await.unwrap(),
        h.store.find_order(failed.id).await.unwrap(),
    ];
    assert_eq!(after, before);
}
