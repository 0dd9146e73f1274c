//! Order service entry point.

use std::sync::Arc;

use api::config::Config;
use api::{OrderAppState, server, telemetry};
use common::BoundedQueue;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{Dispatcher, HttpPaymentInitiator, OrderLifecycle, RecoveryScanner};
use store::{CatalogStore, InMemoryStore, OrderStore, PostgresStore};

#[tokio::main]
async fn main() {
    // 1. Configuration, tracing and the metrics recorder
    let config = Config::from_env();
    telemetry::init_tracing(&config);
    let metrics_handle =
        telemetry::install_metrics().expect("failed to install Prometheus recorder");

    // 2. Outbound client for the payment service
    let initiator = HttpPaymentInitiator::new(&config.payment_queue_url, config.http_timeout)
        .expect("failed to build payment client");

    // 3. Pick the store
    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(&url, config.db_max_connections)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            run(config, store, initiator, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            run(config, InMemoryStore::new(), initiator, metrics_handle).await;
        }
    }
}

async fn run<S>(
    config: Config,
    store: S,
    initiator: HttpPaymentInitiator,
    metrics_handle: PrometheusHandle,
) where
    S: OrderStore + CatalogStore + Clone + 'static,
{
    let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
    let lifecycle = Arc::new(OrderLifecycle::new(
        store.clone(),
        initiator,
        Arc::clone(&queue),
    ));
    let shutdown = server::spawn_signal_listener();

    // 4. Start consuming before recovery fills the queue
    let mut dispatcher = Dispatcher::new(Arc::clone(&lifecycle));
    if let Some(max) = config.max_in_flight {
        dispatcher = dispatcher.with_max_in_flight(max);
    }
    let dispatch_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    // 5. Re-admit orders left behind by the previous run
    let scanner = RecoveryScanner::new(store, Arc::clone(&queue));
    tokio::spawn(async move {
        if let Err(err) = scanner.scan_pending_orders().await {
            tracing::error!(error = %err, "recovery scan failed");
        }
    });

    // 6. Serve until a shutdown signal arrives
    let app = api::create_order_app(Arc::new(OrderAppState::new(lifecycle)), metrics_handle);
    let addr = config.order_addr();
    tracing::info!(%addr, "starting order service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(server::wait_for_shutdown(shutdown))
        .await
        .expect("server error");

    match dispatch_task.await {
        Ok(stats) => tracing::info!(?stats, "order service shut down gracefully"),
        Err(err) => tracing::error!(error = %err, "dispatcher task failed"),
    }
}
