//! Order record and lifecycle state.

mod state;

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

pub use state::OrderState;

use crate::money::Money;

/// A purchase order as persisted by the order service.
///
/// Only the order service mutates these rows, and only through the
/// lifecycle transitions. The payment service sees the order as a
/// [`PaymentRequest`](crate::messages::PaymentRequest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub amount: Money,
    pub state: OrderState,
    /// Diagnostic left by a failed payment initiation or a rejected payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a freshly created order. Stores call this once the id is assigned.
    pub fn created(
        id: OrderId,
        customer_id: CustomerId,
        product_id: ProductId,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            customer_id,
            product_id,
            amount,
            state: OrderState::Created,
            fail_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the dispatcher still has an action for this order.
    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }
}
