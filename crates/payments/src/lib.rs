//! Payment service core.
//!
//! Payment requests published by the order service land in a bounded queue.
//! [`PaymentWorker`] drains it, one task per request: it records a payment,
//! runs the processor once, reports the outcome back to the order service
//! and writes the final payment row.

pub mod error;
pub mod notifier;
pub mod processor;
pub mod worker;

pub use error::{NotifyError, PaymentError, Result};
pub use notifier::{HttpOrderNotifier, InMemoryOrderNotifier, OrderNotifier};
pub use processor::{DEFAULT_PAYMENT_LIMIT, LimitPaymentProcessor, PaymentProcessor};
pub use worker::{PaymentWorker, WorkerStats};
