//! Payment service error types.

use common::PaymentId;
use domain::Money;
use store::StoreError;
use thiserror::Error;

/// Failure to deliver a payment callback to the order service.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The order service answered with a non-success status.
    #[error("order service returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The notifier refused the call (injected by the in-memory notifier).
    #[error("order notification unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while publishing or processing a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The request is malformed; nothing was written.
    #[error("{0}")]
    InvalidRequest(String),

    /// The amount is above what the processor accepts.
    #[error("exceed payment limit")]
    ExceedsLimit { amount: Money, limit: Money },

    #[error("order notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The final payment write matched no row.
    #[error("update of payment {0} affected no rows")]
    UpdateNotApplied(PaymentId),

    /// Several steps of one payment failed.
    #[error("{}", join(.0))]
    Composite(Vec<PaymentError>),
}

impl PaymentError {
    /// Folds collected failures into one error, `None` when there are none.
    pub fn from_failures(mut failures: Vec<PaymentError>) -> Option<PaymentError> {
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            _ => Some(PaymentError::Composite(failures)),
        }
    }

    /// Individual failures, flattening a composite.
    pub fn failures(&self) -> Vec<&PaymentError> {
        match self {
            PaymentError::Composite(errors) => errors.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }
}

fn join(errors: &[PaymentError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_error_uses_fixed_text() {
        let err = PaymentError::ExceedsLimit {
            amount: Money::from_units(2000),
            limit: Money::from_units(1000),
        };
        assert_eq!(err.to_string(), "exceed payment limit");
    }

    #[test]
    fn from_failures_folds() {
        assert!(PaymentError::from_failures(Vec::new()).is_none());

        let single = PaymentError::from_failures(vec![PaymentError::UpdateNotApplied(
            PaymentId::new(1),
        )]);
        assert!(matches!(single, Some(PaymentError::UpdateNotApplied(_))));

        let composite = PaymentError::from_failures(vec![
            PaymentError::ExceedsLimit {
                amount: Money::from_units(2000),
                limit: Money::from_units(1000),
            },
            PaymentError::UpdateNotApplied(PaymentId::new(4)),
        ])
        .unwrap();
        assert_eq!(
            composite.to_string(),
            "exceed payment limit; update of payment 4 affected no rows"
        );
        assert_eq!(composite.failures().len(), 2);
    }
}
