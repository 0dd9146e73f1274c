//! Domain error types.

use thiserror::Error;

use crate::order::OrderState;
use crate::payment::PaymentState;

/// Errors raised by the order state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order is not in the state the action requires.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderState,
        action: &'static str,
    },

    /// A payment outcome that does not settle an order.
    #[error("Unexpected payment state: {0}")]
    UnexpectedPaymentState(PaymentState),
}
