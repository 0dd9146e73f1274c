//! Shared building blocks for the order and payment services.
//!
//! - Numeric identifier newtypes assigned by the storage layer
//! - [`BoundedQueue`], the fixed-capacity FIFO both services consume from

pub mod queue;
pub mod types;

pub use queue::BoundedQueue;
pub use types::{CustomerId, OrderId, PaymentId, ProductId};
