//! Order service core.
//!
//! An order moves through its lifecycle in three hops:
//! 1. Creation reserves the product, persists the order and queues it
//! 2. The dispatcher takes it off the queue and asks the payment service to
//!    charge it (one retry), moving it to `AwaitPayment`
//! 3. The payment callback settles it to `Paid` or `Failed`; paid orders are
//!    queued again and the dispatcher fulfills them
//!
//! The dispatch queue is volatile. [`RecoveryScanner`] re-admits orders
//! left in `Created` or `Paid` when the service starts.

pub mod dispatcher;
pub mod error;
pub mod initiator;
pub mod lifecycle;
pub mod recovery;

pub use dispatcher::{DispatchAction, DispatchStats, Dispatcher};
pub use error::{InitiationError, LifecycleError, Result};
pub use initiator::{HttpPaymentInitiator, InMemoryPaymentInitiator, PaymentInitiator};
pub use lifecycle::{OrderLifecycle, PAYMENT_INITIATION_FAILURE};
pub use recovery::RecoveryScanner;
