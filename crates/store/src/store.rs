use async_trait::async_trait;
use common::{CustomerId, OrderId, PaymentId, ProductId};
use domain::{
    Customer, Money, NewCustomer, NewProduct, Order, OrderState, Payment, PaymentState, Product,
};

use crate::Result;

/// Partial update of an order row.
///
/// When `expected_state` is set the update only applies if the persisted
/// state still matches, and the call reports zero rows otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub expected_state: Option<OrderState>,
    pub state: Option<OrderState>,
    /// `Some(None)` clears the reason, `None` leaves it untouched.
    pub fail_reason: Option<Option<String>>,
}

impl OrderUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the order from `from` to `to`, guarded on `from`.
    pub fn transition(from: OrderState, to: OrderState) -> Self {
        Self {
            expected_state: Some(from),
            state: Some(to),
            fail_reason: None,
        }
    }

    /// Records a failure reason without touching the state.
    pub fn fail_reason(reason: impl Into<String>) -> Self {
        Self {
            fail_reason: Some(Some(reason.into())),
            ..Self::default()
        }
    }

    pub fn with_fail_reason(mut self, reason: Option<String>) -> Self {
        self.fail_reason = Some(reason);
        self
    }

    pub fn clearing_fail_reason(mut self) -> Self {
        self.fail_reason = Some(None);
        self
    }

    /// Applies the update to an in-memory row if the guard holds.
    pub fn apply(&self, order: &mut Order) -> bool {
        if let Some(expected) = self.expected_state
            && order.state != expected
        {
            return false;
        }
        if let Some(state) = self.state {
            order.state = state;
        }
        if let Some(reason) = &self.fail_reason {
            order.fail_reason = reason.clone();
        }
        order.updated_at = chrono::Utc::now();
        true
    }
}

/// Final write of a processed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub state: PaymentState,
    pub result: Option<String>,
    pub is_notified_order: bool,
}

impl PaymentUpdate {
    pub fn apply(&self, payment: &mut Payment) {
        payment.state = self.state;
        payment.result = self.result.clone();
        payment.is_notified_order = self.is_notified_order;
        payment.updated_at = chrono::Utc::now();
    }
}

/// Input for a new payment row, always created in `Created` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
}

/// Order persistence owned by the order service.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Places an order atomically.
    ///
    /// Checks that the customer exists, flips the product's availability
    /// from true to false, and inserts a `Created` order priced at the
    /// product's price. Nothing is written if any step fails.
    async fn place_order(&self, customer_id: CustomerId, product_id: ProductId) -> Result<Order>;

    /// Loads an order, failing with `OrderNotFound` when it does not exist.
    async fn find_order(&self, id: OrderId) -> Result<Order>;

    /// Applies a partial update and returns the number of rows affected.
    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<u64>;

    /// Returns every order in one of the given states, oldest first.
    async fn find_orders_by_states(&self, states: &[OrderState]) -> Result<Vec<Order>>;
}

/// Payment persistence owned by the payment service.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment>;

    /// Writes the final outcome and returns the number of rows affected.
    async fn update_payment(&self, id: PaymentId, update: PaymentUpdate) -> Result<u64>;

    async fn find_payment(&self, id: PaymentId) -> Result<Payment>;

    /// Returns the payments recorded for an order, oldest first.
    async fn find_payments_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>>;
}

/// Customer and product records.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a batch of customers, all or nothing.
    async fn create_customers(&self, customers: Vec<NewCustomer>) -> Result<Vec<Customer>>;

    async fn find_customer(&self, id: CustomerId) -> Result<Customer>;

    /// Inserts a batch of products, all or nothing.
    async fn create_products(&self, products: Vec<NewProduct>) -> Result<Vec<Product>>;

    async fn find_product(&self, id: ProductId) -> Result<Product>;
}
