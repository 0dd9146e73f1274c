use async_trait::async_trait;
use common::{CustomerId, OrderId, PaymentId, ProductId};
use domain::{
    Customer, Money, NewCustomer, NewProduct, Order, OrderState, Payment, PaymentState, Product,
};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{CatalogStore, NewPayment, OrderStore, OrderUpdate, PaymentStore, PaymentUpdate},
};

const ORDER_COLUMNS: &str =
    "id, customer_id, product_id, amount_cents, state, fail_reason, created_at, updated_at";
const PAYMENT_COLUMNS: &str =
    "id, order_id, amount_cents, state, result, is_notified_order, created_at, updated_at";
const CUSTOMER_COLUMNS: &str = "id, name, email, address, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, is_available, created_at, updated_at";

/// PostgreSQL-backed store implementation.
///
/// Ids are `BIGSERIAL`, money is stored as integer cents and states as
/// their `SMALLINT` codes.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::debug!("database migrations applied");
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let code: i16 = row.try_get("state")?;
        let state = OrderState::from_code(code).ok_or_else(|| StoreError::CorruptRow {
            table: "orders",
            detail: format!("unknown state code {code}"),
        })?;

        Ok(Order {
            id: OrderId::new(row.try_get::<i64, _>("id")? as u64),
            customer_id: CustomerId::new(row.try_get::<i64, _>("customer_id")? as u64),
            product_id: ProductId::new(row.try_get::<i64, _>("product_id")? as u64),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            state,
            fail_reason: row.try_get("fail_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        let code: i16 = row.try_get("state")?;
        let state = PaymentState::from_code(code).ok_or_else(|| StoreError::CorruptRow {
            table: "payments",
            detail: format!("unknown state code {code}"),
        })?;

        Ok(Payment {
            id: PaymentId::new(row.try_get::<i64, _>("id")? as u64),
            order_id: OrderId::new(row.try_get::<i64, _>("order_id")? as u64),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            state,
            result: row.try_get("result")?,
            is_notified_order: row.try_get("is_notified_order")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::new(row.try_get::<i64, _>("id")? as u64),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<i64, _>("id")? as u64),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, customer_id: CustomerId, product_id: ProductId) -> Result<Order> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        let customer: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = $1")
            .bind(customer_id.get() as i64)
            .fetch_optional(&mut *tx)
            .await?;
        if customer.is_none() {
            return Err(StoreError::CustomerNotFound(customer_id));
        }

        let price: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET is_available = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_available = TRUE
            RETURNING price_cents
            "#,
        )
        .bind(product_id.get() as i64)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(price) = price else {
            return Err(StoreError::ProductNotAvailable(product_id));
        };

        let row = sqlx::query(&format!(
            "INSERT INTO orders (customer_id, product_id, amount_cents, state) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(customer_id.get() as i64)
        .bind(product_id.get() as i64)
        .bind(price)
        .bind(OrderState::Created.code())
        .fetch_one(&mut *tx)
        .await?;

        let order = Self::row_to_order(row)?;
        tx.commit().await?;
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.get() as i64)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<u64> {
        let (touch_reason, reason) = match update.fail_reason {
            Some(reason) => (true, reason),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET state = COALESCE($2::SMALLINT, state),
                fail_reason = CASE WHEN $3 THEN $4::TEXT ELSE fail_reason END,
                updated_at = NOW()
            WHERE id = $1 AND ($5::SMALLINT IS NULL OR state = $5)
            "#,
        )
        .bind(id.get() as i64)
        .bind(update.state.map(|s| s.code()))
        .bind(touch_reason)
        .bind(reason)
        .bind(update.expected_state.map(|s| s.code()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_orders_by_states(&self, states: &[OrderState]) -> Result<Vec<Order>> {
        let codes: Vec<i16> = states.iter().map(OrderState::code).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE state = ANY($1) ORDER BY id ASC"
        ))
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

#[async_trait]
impl PaymentStore for PostgresStore {
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment> {
        let row = sqlx::query(&format!(
            "INSERT INTO payments (order_id, amount_cents, state) \
             VALUES ($1, $2, $3) RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment.order_id.get() as i64)
        .bind(payment.amount.cents())
        .bind(PaymentState::Created.code())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_payment(row)
    }

    async fn update_payment(&self, id: PaymentId, update: PaymentUpdate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET state = $2, result = $3, is_notified_order = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.get() as i64)
        .bind(update.state.code())
        .bind(update.result)
        .bind(update.is_notified_order)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_payment(&self, id: PaymentId) -> Result<Payment> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.get() as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_payment(row),
            None => Err(StoreError::PaymentNotFound(id)),
        }
    }

    async fn find_payments_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id.get() as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn create_customers(&self, customers: Vec<NewCustomer>) -> Result<Vec<Customer>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(customers.len());

        for customer in customers {
            let row = sqlx::query(&format!(
                "INSERT INTO customers (name, email, address) \
                 VALUES ($1, $2, $3) RETURNING {CUSTOMER_COLUMNS}"
            ))
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.address)
            .fetch_one(&mut *tx)
            .await?;
            created.push(Self::row_to_customer(row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Customer> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.get() as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_customer(row),
            None => Err(StoreError::CustomerNotFound(id)),
        }
    }

    async fn create_products(&self, products: Vec<NewProduct>) -> Result<Vec<Product>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(products.len());

        for product in products {
            let row = sqlx::query(&format!(
                "INSERT INTO products (name, description, price_cents, is_available) \
                 VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.cents())
            .bind(product.is_available)
            .fetch_one(&mut *tx)
            .await?;
            created.push(Self::row_to_product(row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_product(&self, id: ProductId) -> Result<Product> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.get() as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::ProductNotFound(id)),
        }
    }
}
