//! Persistence for the order and payment services.
//!
//! Two implementations share the same traits:
//! - [`InMemoryStore`] for tests and for running without a database
//! - [`PostgresStore`] backed by sqlx
//!
//! State changes go through `update_*` calls that return the number of rows
//! affected. An update carrying an expected state is a compare-and-swap:
//! zero rows means the guard did not hold.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CatalogStore, NewPayment, OrderStore, OrderUpdate, PaymentStore, PaymentUpdate};
