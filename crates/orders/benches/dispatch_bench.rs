use std::sync::Arc;

use common::{BoundedQueue, CustomerId, OrderId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateOrderRequest, Money, NewCustomer, NewProduct, Order, OrderState,
};
use orders::{Dispatcher, InMemoryPaymentInitiator, OrderLifecycle};
use store::{CatalogStore, InMemoryStore};

fn make_order(id: u64) -> Order {
    Order::created(
        OrderId::new(id),
        CustomerId::new(1),
        ProductId::new(id),
        Money::from_units(100),
    )
}

fn bench_queue_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let queue = BoundedQueue::new(1024);

    c.bench_function("dispatch_queue/enqueue_dequeue", |b| {
        b.iter(|| {
            rt.block_on(async {
                queue.enqueue(make_order(1)).await;
                queue.dequeue().await.unwrap();
            });
        });
    });
}

fn bench_queue_fill_and_drain_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("dispatch_queue/fill_and_drain_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let queue = BoundedQueue::new(1000);
                for id in 1..=1000 {
                    queue.enqueue(make_order(id)).await;
                }
                while queue.try_dequeue().is_some() {}
            });
        });
    });
}

fn bench_route(c: &mut Criterion) {
    let mut paid = make_order(1);
    paid.state = OrderState::Paid;

    c.bench_function("dispatcher/route", |b| {
        b.iter(|| {
            Dispatcher::<InMemoryStore, InMemoryPaymentInitiator>::route(std::hint::black_box(
                &paid,
            ))
        });
    });
}

fn bench_create_and_initiate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("lifecycle/create_and_initiate_payment", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                store
                    .create_customers(vec![NewCustomer::new("Ada")])
                    .await
                    .unwrap();
                store
                    .create_products(vec![NewProduct::new("Lamp", Money::from_units(100))])
                    .await
                    .unwrap();
                let queue = Arc::new(BoundedQueue::new(4));
                let lifecycle = OrderLifecycle::new(store, InMemoryPaymentInitiator::new(), queue);

                let order = lifecycle
                    .create_order(CreateOrderRequest::new(CustomerId::new(1), ProductId::new(1)))
                    .await
                    .unwrap();
                lifecycle.initiate_payment(&order).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_queue_round_trip,
    bench_queue_fill_and_drain_1000,
    bench_route,
    bench_create_and_initiate,
);
criterion_main!(benches);
