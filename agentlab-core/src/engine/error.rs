//! Engine error taxonomy. No partial results accompany any error.

use crate::policy::PolicyError;

/// Precondition violations, reported before any bar is simulated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("state sequence is empty")]
    EmptyStates,
    #[error("state {index} has no prices")]
    EmptyPrices { index: usize },
    #[error("initial balance must be positive and finite, got {0}")]
    NonPositiveBalance(f64),
    #[error("state {index} has invalid execution price {price}")]
    InvalidPrice { index: usize, price: f64 },
    #[error("state {index} timestamp {timestamp} is outside the calendar range")]
    TimestampOutOfRange { index: usize, timestamp: i64 },
    #[error("state {index} timestamp {timestamp} precedes previous timestamp {previous}")]
    TimestampOrder {
        index: usize,
        timestamp: i64,
        previous: i64,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("policy failed at bar {bar}: {source}")]
    PolicyFailure {
        bar: usize,
        #[source]
        source: PolicyError,
    },
}

impl BacktestError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, BacktestError::InvalidInput(_))
    }

    pub fn is_policy_failure(&self) -> bool {
        matches!(self, BacktestError::PolicyFailure { .. })
    }
}
