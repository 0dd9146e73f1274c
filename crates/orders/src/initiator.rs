//! Outbound payment initiation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::PaymentRequest;
use reqwest::{Client, StatusCode};

use crate::error::InitiationError;

/// Hands an order to the payment service.
///
/// One call is one attempt; the lifecycle decides whether to retry.
#[async_trait]
pub trait PaymentInitiator: Send + Sync {
    async fn initiate(&self, request: &PaymentRequest) -> Result<(), InitiationError>;
}

/// Posts the order as JSON to the payment service's queue endpoint.
///
/// Anything other than `200 OK` is a failure.
#[derive(Debug, Clone)]
pub struct HttpPaymentInitiator {
    client: Client,
    endpoint: String,
}

impl HttpPaymentInitiator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, InitiationError> {
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
impl PaymentInitiator for HttpPaymentInitiator {
    async fn initiate(&self, request: &PaymentRequest) -> Result<(), InitiationError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::debug!(
                endpoint = %self.endpoint,
                order_id = %request.order_id,
                "payment request accepted"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(InitiationError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

#[derive(Debug, Default)]
struct InMemoryInitiatorState {
    requests: Vec<PaymentRequest>,
    attempts: usize,
    failures_left: usize,
}

/// In-memory payment initiator for testing.
///
/// Records every accepted request and can be told to fail a number of
/// upcoming calls.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentInitiator {
    state: Arc<Mutex<InMemoryInitiatorState>>,
}

impl InMemoryPaymentInitiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls fail.
    pub fn fail_next(&self, times: usize) {
        self.lock().failures_left = times;
    }

    /// Requests accepted so far, in call order.
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.lock().requests.clone()
    }

    /// Number of calls made, failed ones included.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryInitiatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentInitiator for InMemoryPaymentInitiator {
    async fn initiate(&self, request: &PaymentRequest) -> Result<(), InitiationError> {
        let mut state = self.lock();
        state.attempts += 1;

        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(InitiationError::Unavailable(format!(
                "payment request for order {} refused",
                request.order_id
            )));
        }

        state.requests.push(*request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, OrderId, ProductId};
    use domain::Money;

    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::new(1),
            customer_id: CustomerId::new(1),
            product_id: ProductId::new(1),
            amount: Money::from_units(100),
        }
    }

    #[tokio::test]
    async fn records_accepted_requests() {
        let initiator = InMemoryPaymentInitiator::new();
        initiator.initiate(&request()).await.unwrap();

        assert_eq!(initiator.attempts(), 1);
        assert_eq!(initiator.requests(), vec![request()]);
    }

    #[tokio::test]
    async fn fails_the_requested_number_of_calls() {
        let initiator = InMemoryPaymentInitiator::new();
        initiator.fail_next(2);

        assert!(initiator.initiate(&request()).await.is_err());
        assert!(initiator.initiate(&request()).await.is_err());
        assert!(initiator.initiate(&request()).await.is_ok());
        assert_eq!(initiator.attempts(), 3);
        assert_eq!(initiator.requests().len(), 1);
    }

    #[tokio::test]
    async fn http_initiator_reports_connection_failure() {
        // Nothing listens on the discard port
        let initiator =
            HttpPaymentInitiator::new("http://127.0.0.1:9/payment/new_payment", Duration::from_secs(2))
                .unwrap();
        let err = initiator.initiate(&request()).await.unwrap_err();
        assert!(matches!(err, InitiationError::Http(_)));
    }
}
