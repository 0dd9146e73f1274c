use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{CustomerId, OrderId, PaymentId, ProductId};
use domain::{Customer, NewCustomer, NewProduct, Order, OrderState, Payment, Product};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CatalogStore, NewPayment, OrderStore, OrderUpdate, PaymentStore, PaymentUpdate},
};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    payments: BTreeMap<PaymentId, Payment>,
    last_customer_id: u64,
    last_product_id: u64,
    last_order_id: u64,
    last_payment_id: u64,
}

/// In-memory store implementation.
///
/// Used by the tests and by the services when no database is configured.
/// All tables sit behind one lock, so every call is atomic. Clones share
/// the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_order_updates: Arc<AtomicBool>,
    fail_payment_updates: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `update_order` call fail.
    pub fn set_fail_order_updates(&self, fail: bool) {
        self.fail_order_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `update_payment` call fail.
    pub fn set_fail_payment_updates(&self, fail: bool) {
        self.fail_payment_updates.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of payments stored.
    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, customer_id: CustomerId, product_id: ProductId) -> Result<Order> {
        let mut tables = self.tables.write().await;

        if !tables.customers.contains_key(&customer_id) {
            return Err(StoreError::CustomerNotFound(customer_id));
        }

        let price = match tables.products.get_mut(&product_id) {
            Some(product) if product.is_available => {
                product.is_available = false;
                product.updated_at = chrono::Utc::now();
                product.price
            }
            _ => return Err(StoreError::ProductNotAvailable(product_id)),
        };

        tables.last_order_id += 1;
        let order = Order::created(
            OrderId::new(tables.last_order_id),
            customer_id,
            product_id,
            price,
        );
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Order> {
        self.tables
            .read()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<u64> {
        if self.fail_order_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("update of order {id} refused")));
        }

        let mut tables = self.tables.write().await;
        let applied = tables
            .orders
            .get_mut(&id)
            .is_some_and(|order| update.apply(order));
        Ok(u64::from(applied))
    }

    async fn find_orders_by_states(&self, states: &[OrderState]) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|order| states.contains(&order.state))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        tables.last_payment_id += 1;
        let payment = Payment::created(
            PaymentId::new(tables.last_payment_id),
            payment.order_id,
            payment.amount,
        );
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update_payment(&self, id: PaymentId, update: PaymentUpdate) -> Result<u64> {
        if self.fail_payment_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "update of payment {id} refused"
            )));
        }

        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&id) {
            Some(payment) => {
                update.apply(payment);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_payment(&self, id: PaymentId) -> Result<Payment> {
        self.tables
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or(StoreError::PaymentNotFound(id))
    }

    async fn find_payments_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|payment| payment.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_customers(&self, customers: Vec<NewCustomer>) -> Result<Vec<Customer>> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::with_capacity(customers.len());
        for input in customers {
            tables.last_customer_id += 1;
            let customer = input.into_customer(CustomerId::new(tables.last_customer_id));
            tables.customers.insert(customer.id, customer.clone());
            created.push(customer);
        }
        Ok(created)
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Customer> {
        self.tables
            .read()
            .await
            .customers
            .get(&id)
            .cloned()
            .ok_or(StoreError::CustomerNotFound(id))
    }

    async fn create_products(&self, products: Vec<NewProduct>) -> Result<Vec<Product>> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::with_capacity(products.len());
        for input in products {
            tables.last_product_id += 1;
            let product = input.into_product(ProductId::new(tables.last_product_id));
            tables.products.insert(product.id, product.clone());
            created.push(product);
        }
        Ok(created)
    }

    async fn find_product(&self, id: ProductId) -> Result<Product> {
        self.tables
            .read()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, PaymentState};

    use super::*;

    async fn seeded(price: Money, available: bool) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_customers(vec![NewCustomer::new("Ada")])
            .await
            .unwrap();
        let mut product = NewProduct::new("Lamp", price);
        product.is_available = available;
        store.create_products(vec![product]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn place_order_reserves_product_and_uses_its_price() {
        let store = seeded(Money::from_units(100), true).await;

        let order = store
            .place_order(CustomerId::new(1), ProductId::new(1))
            .await
            .unwrap();

        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.state, OrderState::Created);
        assert_eq!(order.amount, Money::from_units(100));

        let product = store.find_product(ProductId::new(1)).await.unwrap();
        assert!(!product.is_available);
    }

    #[tokio::test]
    async fn place_order_rejects_unavailable_product() {
        let store = seeded(Money::from_units(100), false).await;

        let err = store
            .place_order(CustomerId::new(1), ProductId::new(1))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ProductNotAvailable(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn place_order_rejects_unknown_customer_without_reserving() {
        let store = seeded(Money::from_units(100), true).await;

        let err = store
            .place_order(CustomerId::new(99), ProductId::new(1))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::CustomerNotFound(_)));
        assert!(store.find_product(ProductId::new(1)).await.unwrap().is_available);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn second_order_for_same_product_fails() {
        let store = seeded(Money::from_units(100), true).await;
        store
            .place_order(CustomerId::new(1), ProductId::new(1))
            .await
            .unwrap();

        let err = store
            .place_order(CustomerId::new(1), ProductId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ProductNotAvailable(_)));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn guarded_update_reports_zero_rows_on_mismatch() {
        let store = seeded(Money::from_units(100), true).await;
        let order = store
            .place_order(CustomerId::new(1), ProductId::new(1))
            .await
            .unwrap();

        let rows = store
            .update_order(
                order.id,
                OrderUpdate::transition(OrderState::AwaitPayment, OrderState::Paid),
            )
            .await
            .unwrap();
        assert_eq!(rows, 0);

        let rows = store
            .update_order(
                order.id,
                OrderUpdate::transition(OrderState::Created, OrderState::AwaitPayment),
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            store.find_order(order.id).await.unwrap().state,
            OrderState::AwaitPayment
        );
    }

    #[tokio::test]
    async fn update_of_missing_order_affects_nothing() {
        let store = InMemoryStore::new();
        let rows = store
            .update_order(OrderId::new(5), OrderUpdate::fail_reason("x"))
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn find_orders_by_states_filters() {
        let store = InMemoryStore::new();
        store
            .create_customers(vec![NewCustomer::new("Ada")])
            .await
            .unwrap();
        store
            .create_products(vec![
                NewProduct::new("A", Money::from_units(1)),
                NewProduct::new("B", Money::from_units(2)),
                NewProduct::new("C", Money::from_units(3)),
            ])
            .await
            .unwrap();
        for product in 1..=3 {
            store
                .place_order(CustomerId::new(1), ProductId::new(product))
                .await
                .unwrap();
        }
        store
            .update_order(
                OrderId::new(2),
                OrderUpdate::transition(OrderState::Created, OrderState::AwaitPayment),
            )
            .await
            .unwrap();

        let pending = store
            .find_orders_by_states(&OrderState::PENDING)
            .await
            .unwrap();
        let ids: Vec<_> = pending.iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = InMemoryStore::new();
        store.set_fail_order_updates(true);
        store.set_fail_payment_updates(true);

        assert!(
            store
                .update_order(OrderId::new(1), OrderUpdate::new())
                .await
                .is_err()
        );
        let payment = store
            .create_payment(NewPayment {
                order_id: OrderId::new(1),
                amount: Money::zero(),
            })
            .await
            .unwrap();
        let update = PaymentUpdate {
            state: PaymentState::Success,
            result: None,
            is_notified_order: true,
        };
        assert!(matches!(
            store.update_payment(payment.id, update).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn payments_by_order() {
        let store = InMemoryStore::new();
        for order in [1, 2, 1] {
            store
                .create_payment(NewPayment {
                    order_id: OrderId::new(order),
                    amount: Money::from_units(10),
                })
                .await
                .unwrap();
        }

        let payments = store.find_payments_by_order(OrderId::new(1)).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.state == PaymentState::Created));
        assert_eq!(store.payment_count().await, 3);
    }

    #[tokio::test]
    async fn lookups_report_missing_rows() {
        let store = InMemoryStore::new();
        assert!(store.find_order(OrderId::new(1)).await.unwrap_err().is_not_found());
        assert!(
            store
                .find_payment(PaymentId::new(1))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            store
                .find_customer(CustomerId::new(1))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
