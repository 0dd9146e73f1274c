//! Domain layer shared by the order and payment services.
//!
//! This crate provides:
//! - The six-state order lifecycle and its transition guards
//! - Order, payment, customer and product records
//! - Fixed-point money
//! - The messages exchanged between the two services

pub mod catalog;
pub mod error;
pub mod messages;
pub mod money;
pub mod order;
pub mod payment;

pub use catalog::{Customer, NewCustomer, NewProduct, Product};
pub use common::{CustomerId, OrderId, PaymentId, ProductId};
pub use error::OrderError;
pub use messages::{CreateOrderRequest, PaymentCallback, PaymentDetail, PaymentRequest};
pub use money::Money;
pub use order::{Order, OrderState};
pub use payment::{Payment, PaymentState};
