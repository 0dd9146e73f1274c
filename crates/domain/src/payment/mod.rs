//! Payment record owned by the payment service.

mod state;

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use serde::{Deserialize, Serialize};

pub use state::PaymentState;

use crate::money::Money;

/// Result text recorded for a successful payment.
pub const PAYMENT_SUCCEEDED: &str = "Succeed";

/// One payment attempt for an order.
///
/// Exactly one row is created per request taken off the payment queue.
/// `is_notified_order` turns true only after the order service accepted the
/// callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub state: PaymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub is_notified_order: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a payment in `Created` state for the given order.
    pub fn created(id: PaymentId, order_id: OrderId, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id,
            order_id,
            amount,
            state: PaymentState::Created,
            result: None,
            is_notified_order: false,
            created_at: now,
            updated_at: now,
        }
    }
}
