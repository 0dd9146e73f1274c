use serde::{Deserialize, Serialize};

/// State of a payment record owned by the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentState {
    /// Row created, processor not yet called.
    #[default]
    Created,
    Success,
    Failed,
    /// Reserved for refunds; nothing produces it.
    Refund,
}

impl PaymentState {
    pub const ALL: [PaymentState; 4] = [
        PaymentState::Created,
        PaymentState::Success,
        PaymentState::Failed,
        PaymentState::Refund,
    ];

    /// Returns true for outcomes that settle an order (`Success` or `Failed`).
    pub fn is_outcome(&self) -> bool {
        matches!(self, PaymentState::Success | PaymentState::Failed)
    }

    /// Numeric code used for persistence.
    pub fn code(&self) -> i16 {
        match self {
            PaymentState::Created => 0,
            PaymentState::Success => 1,
            PaymentState::Failed => 2,
            PaymentState::Refund => 3,
        }
    }

    /// Parses a persisted numeric code.
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Created => "CREATED",
            PaymentState::Success => "SUCCESS",
            PaymentState::Failed => "FAILED",
            PaymentState::Refund => "REFUND",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes() {
        assert!(PaymentState::Success.is_outcome());
        assert!(PaymentState::Failed.is_outcome());
        assert!(!PaymentState::Created.is_outcome());
        assert!(!PaymentState::Refund.is_outcome());
    }

    #[test]
    fn test_codes() {
        assert_eq!(PaymentState::Created.code(), 0);
        assert_eq!(PaymentState::Refund.code(), 3);
        for state in PaymentState::ALL {
            assert_eq!(PaymentState::from_code(state.code()), Some(state));
        }
        assert_eq!(PaymentState::from_code(-1), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentState::Success).unwrap(),
            "\"SUCCESS\""
        );
        let state: PaymentState = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(state, PaymentState::Failed);
    }
}
