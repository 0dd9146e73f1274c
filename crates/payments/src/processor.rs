//! Payment processing.

use async_trait::async_trait;
use domain::{Money, PaymentRequest};

use crate::error::PaymentError;

/// Highest amount the default processor accepts.
pub const DEFAULT_PAYMENT_LIMIT: Money = Money::from_units(1000);

/// Charges a payment. Called once per request, never retried.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process(&self, request: &PaymentRequest) -> Result<(), PaymentError>;
}

/// Accepts any amount up to a limit and rejects the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPaymentProcessor {
    limit: Money,
}

impl LimitPaymentProcessor {
    pub fn new(limit: Money) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Money {
        self.limit
    }
}

impl Default for LimitPaymentProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_LIMIT)
    }
}

#[async_trait]
impl PaymentProcessor for LimitPaymentProcessor {
    async fn process(&self, request: &PaymentRequest) -> Result<(), PaymentError> {
        if request.amount > self.limit {
            return Err(PaymentError::ExceedsLimit {
                amount: request.amount,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, OrderId, ProductId};

    use super::*;

    fn request(amount: Money) -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::new(1),
            customer_id: CustomerId::new(1),
            product_id: ProductId::new(1),
            amount,
        }
    }

    #[tokio::test]
    async fn accepts_up_to_the_limit() {
        let processor = LimitPaymentProcessor::default();
        assert!(processor.process(&request(Money::from_units(100))).await.is_ok());
        assert!(processor.process(&request(Money::from_units(1000))).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_above_the_limit() {
        let processor = LimitPaymentProcessor::default();
        let err = processor
            .process(&request(Money::from_units(2000)))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ExceedsLimit { .. }));

        let err = processor
            .process(&request(Money::from_cents(100_001)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "exceed payment limit");
    }
}
