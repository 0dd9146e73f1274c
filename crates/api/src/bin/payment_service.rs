//! Payment service entry point.

use std::sync::Arc;

use api::config::Config;
use api::{PaymentAppState, server, telemetry};
use common::BoundedQueue;
use metrics_exporter_prometheus::PrometheusHandle;
use payments::{HttpOrderNotifier, LimitPaymentProcessor, PaymentWorker};
use store::{InMemoryStore, PaymentStore, PostgresStore};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    telemetry::init_tracing(&config);
    let metrics_handle =
        telemetry::install_metrics().expect("failed to install Prometheus recorder");

    let notifier = HttpOrderNotifier::new(&config.order_callback_url, config.http_timeout)
        .expect("failed to build order service client");

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(&url, config.db_max_connections)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            run(config, store, notifier, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, payments are kept in memory");
            run(config, InMemoryStore::new(), notifier, metrics_handle).await;
        }
    }
}

async fn run<S>(
    config: Config,
    store: S,
    notifier: HttpOrderNotifier,
    metrics_handle: PrometheusHandle,
) where
    S: PaymentStore + 'static,
{
    let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
    let processor = LimitPaymentProcessor::new(config.payment_limit);
    let mut worker = PaymentWorker::new(store, processor, notifier, queue);
    if let Some(max) = config.max_in_flight {
        worker = worker.with_max_in_flight(max);
    }
    let worker = Arc::new(worker);
    let shutdown = server::spawn_signal_listener();

    let worker_task = tokio::spawn(Arc::clone(&worker).run(shutdown.clone()));

    let state = Arc::new(PaymentAppState { worker });
    let app = api::create_payment_app(state, metrics_handle);
    let addr = config.payment_addr();
    tracing::info!(%addr, limit = %config.payment_limit, "starting payment service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(server::wait_for_shutdown(shutdown))
        .await
        .expect("server error");

    match worker_task.await {
        Ok(stats) => tracing::info!(?stats, "payment service shut down gracefully"),
        Err(err) => tracing::error!(error = %err, "payment worker task failed"),
    }
}
