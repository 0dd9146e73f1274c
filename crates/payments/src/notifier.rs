//! Callback from the payment service to the order service.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::PaymentCallback;
use reqwest::{Client, StatusCode};

use crate::error::NotifyError;

/// Reports a payment outcome to the order service.
///
/// One call is one delivery attempt; nothing retries it.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, callback: &PaymentCallback) -> Result<(), NotifyError>;
}

/// Posts the callback as JSON to the order service.
///
/// Anything other than `200 OK` is a failure, including the conflict the
/// order service returns when the order is not awaiting payment.
#[derive(Debug, Clone)]
pub struct HttpOrderNotifier {
    client: Client,
    endpoint: String,
}

impl HttpOrderNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl OrderNotifier for HttpOrderNotifier {
    async fn notify(&self, callback: &PaymentCallback) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(callback)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::debug!(
                endpoint = %self.endpoint,
                order_id = %callback.order_id,
                "order service accepted payment callback"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    delivered: Vec<PaymentCallback>,
    fail: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryOrderNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every call.
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Callbacks delivered so far.
    pub fn delivered(&self) -> Vec<PaymentCallback> {
        self.lock().delivered.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryNotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderNotifier for InMemoryOrderNotifier {
    async fn notify(&self, callback: &PaymentCallback) -> Result<(), NotifyError> {
        let mut state = self.lock();
        if state.fail {
            return Err(NotifyError::Unavailable(format!(
                "callback for order {} refused",
                callback.order_id
            )));
        }
        state.delivered.push(callback.clone());
        Ok(())
    }
}
