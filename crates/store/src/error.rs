use common::{CustomerId, OrderId, PaymentId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product does not exist or has already been reserved.
    #[error("product not available: {0}")]
    ProductNotAvailable(ProductId),

    /// A persisted row holds a value the domain does not know.
    #[error("Corrupt row in {table}: {detail}")]
    CorruptRow { table: &'static str, detail: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store refused the operation (injected by the in-memory store).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for the lookup-miss variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::OrderNotFound(_)
                | StoreError::PaymentNotFound(_)
                | StoreError::CustomerNotFound(_)
                | StoreError::ProductNotFound(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
