//! Requests and notifications exchanged between the services.

use common::{CustomerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::Order;
use crate::payment::PaymentState;

pub const INVALID_ORDER_ID: &str = "Order ID is invalid";
pub const INVALID_CUSTOMER_ID: &str = "Customer ID is invalid";
pub const INVALID_PRODUCT_ID: &str = "Product ID is invalid";
pub const INVALID_AMOUNT: &str = "Order Amount is invalid";

/// Client request to place an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
}

impl CreateOrderRequest {
    pub fn new(customer_id: CustomerId, product_id: ProductId) -> Self {
        Self {
            customer_id,
            product_id,
        }
    }

    /// Returns every problem with the request; empty when valid.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if !self.customer_id.is_assigned() {
            problems.push(INVALID_CUSTOMER_ID);
        }
        if !self.product_id.is_assigned() {
            problems.push(INVALID_PRODUCT_ID);
        }
        problems
    }
}

/// The order as the payment service receives it.
///
/// Serialized with the order id under `id`, matching the order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "id")]
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub product_id: ProductId,
    pub amount: Money,
}

impl PaymentRequest {
    /// Returns every problem with the request; empty when valid.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if !self.order_id.is_assigned() {
            problems.push(INVALID_ORDER_ID);
        }
        if !self.customer_id.is_assigned() {
            problems.push(INVALID_CUSTOMER_ID);
        }
        if self.amount.is_negative() {
            problems.push(INVALID_AMOUNT);
        }
        problems
    }
}

impl From<&Order> for PaymentRequest {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            product_id: order.product_id,
            amount: order.amount,
        }
    }
}

/// Outcome of a payment as reported to the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub state: PaymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Callback the payment service posts back to the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_id: OrderId,
    pub payment_detail: PaymentDetail,
}

impl PaymentCallback {
    pub fn new(order_id: OrderId, state: PaymentState, result: Option<String>) -> Self {
        Self {
            order_id,
            payment_detail: PaymentDetail { state, result },
        }
    }

    pub fn state(&self) -> PaymentState {
        self.payment_detail.state
    }

    pub fn result(&self) -> Option<&str> {
        self.payment_detail.result.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_request_problems() {
        let ok = CreateOrderRequest::new(CustomerId::new(1), ProductId::new(1));
        assert!(ok.problems().is_empty());

        let bad = CreateOrderRequest::new(CustomerId::new(0), ProductId::new(0));
        assert_eq!(bad.problems(), vec![INVALID_CUSTOMER_ID, INVALID_PRODUCT_ID]);
    }

    #[test]
    fn test_payment_request_collects_all_problems() {
        let request = PaymentRequest {
            order_id: OrderId::new(0),
            customer_id: CustomerId::new(0),
            product_id: ProductId::new(0),
            amount: Money::from_cents(-1),
        };
        assert_eq!(
            request.problems(),
            vec![INVALID_ORDER_ID, INVALID_CUSTOMER_ID, INVALID_AMOUNT]
        );
    }

    #[test]
    fn test_payment_request_zero_amount_is_valid() {
        let request = PaymentRequest {
            order_id: OrderId::new(3),
            customer_id: CustomerId::new(1),
            product_id: ProductId::new(2),
            amount: Money::zero(),
        };
        assert!(request.problems().is_empty());
    }

    #[test]
    fn test_payment_request_from_order_uses_id_key() {
        let order = Order::created(
            OrderId::new(7),
            CustomerId::new(1),
            ProductId::new(2),
            Money::from_units(100),
        );
        let json = serde_json::to_value(PaymentRequest::from(&order)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["amount"], 10_000);

        // The full order record is accepted as well.
        let full = serde_json::to_string(&order).unwrap();
        let parsed: PaymentRequest = serde_json::from_str(&full).unwrap();
        assert_eq!(parsed.order_id, OrderId::new(7));
    }

    #[test]
    fn test_callback_wire_format() {
        let callback = PaymentCallback::new(OrderId::new(5), PaymentState::Success, None);
        let json = serde_json::to_value(&callback).unwrap();
        assert_eq!(json["order_id"], 5);
        assert_eq!(json["payment_detail"]["state"], "SUCCESS");
        assert!(json["payment_detail"].get("result").is_none());

        let parsed: PaymentCallback = serde_json::from_str(
            r#"{"order_id":5,"payment_detail":{"state":"FAILED","result":"exceed payment limit"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.state(), PaymentState::Failed);
        assert_eq!(parsed.result(), Some("exceed payment limit"));
    }
}
