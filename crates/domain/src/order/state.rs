//! Order state machine.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::payment::PaymentState;

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► AwaitPayment ──┬──► Paid ──► Fulfilled
///    │             │         └──► Failed
///    └─────────────┴──► Canceled   (reserved, nothing produces it yet)
/// ```
///
/// A failed payment initiation leaves the order in `Created` with a failure
/// reason recorded; only the payment callback moves an order to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderState {
    /// Persisted and queued for payment initiation.
    #[default]
    Created,

    /// The payment service accepted the request; waiting for its callback.
    AwaitPayment,

    /// Payment succeeded, queued for fulfillment.
    Paid,

    /// Order has been fulfilled (terminal state).
    Fulfilled,

    /// Payment was rejected (terminal state).
    Failed,

    /// Order was canceled (terminal state, reserved).
    Canceled,
}

impl OrderState {
    /// All states, in code order.
    pub const ALL: [OrderState; 6] = [
        OrderState::Created,
        OrderState::AwaitPayment,
        OrderState::Paid,
        OrderState::Fulfilled,
        OrderState::Failed,
        OrderState::Canceled,
    ];

    /// States that the dispatcher still has work for. Orders persisted in
    /// one of these are re-admitted to the dispatch queue on startup.
    pub const PENDING: [OrderState; 2] = [OrderState::Created, OrderState::Paid];

    /// Returns true if payment initiation may run in this state.
    pub fn can_initiate_payment(&self) -> bool {
        matches!(self, OrderState::Created)
    }

    /// Returns true if a payment callback may be applied in this state.
    pub fn can_accept_payment_result(&self) -> bool {
        matches!(self, OrderState::AwaitPayment)
    }

    /// Returns true if the order can be fulfilled in this state.
    pub fn can_fulfill(&self) -> bool {
        matches!(self, OrderState::Paid)
    }

    /// Returns true if the order could be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderState::Created | OrderState::AwaitPayment)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Fulfilled | OrderState::Failed | OrderState::Canceled
        )
    }

    /// Returns true if the dispatcher has an action for this state.
    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }

    /// Resolves the state a payment outcome moves an `AwaitPayment` order to.
    pub fn after_payment(&self, outcome: PaymentState) -> Result<OrderState, OrderError> {
        if !self.can_accept_payment_result() {
            return Err(OrderError::InvalidStateTransition {
                current_state: *self,
                action: "apply payment result",
            });
        }

        match outcome {
            PaymentState::Success => Ok(OrderState::Paid),
            PaymentState::Failed => Ok(OrderState::Failed),
            other => Err(OrderError::UnexpectedPaymentState(other)),
        }
    }

    /// Numeric code used for persistence.
    pub fn code(&self) -> i16 {
        match self {
            OrderState::Created => 0,
            OrderState::AwaitPayment => 1,
            OrderState::Paid => 2,
            OrderState::Fulfilled => 3,
            OrderState::Failed => 4,
            OrderState::Canceled => 5,
        }
    }

    /// Parses a persisted numeric code.
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::AwaitPayment => "AWAITPAYMENT",
            OrderState::Paid => "PAID",
            OrderState::Fulfilled => "FULFILLED",
            OrderState::Failed => "FAILED",
            OrderState::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
