//! Policies: the engine's extension point.
//!
//! A policy maps a [`MarketState`] to an [`Action`]. Implementations may keep
//! internal state (a trained model, an RNG, a script cursor), but the engine
//! never relies on it: every bar is a fresh `decide` call, in input order.

pub mod factory;
pub mod momentum;
pub mod scripted;
pub mod threshold;

pub use factory::{create_policy, create_trainable, FactoryError, PolicyConfig};
pub use momentum::MomentumPolicy;
pub use scripted::{ScriptedAction, ScriptedPolicy};
pub use threshold::ThresholdPolicy;

use crate::domain::{Action, MarketState};

/// Errors a policy can raise for a single bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("action amount must be non-negative, got {0}")]
    NegativeAmount(f64),
    #[error("action amount must be finite")]
    NonFiniteAmount,
    #[error("unknown action kind '{0}'")]
    UnknownKind(String),
    #[error("script exhausted after {0} actions")]
    ScriptExhausted(usize),
    #[error("{0}")]
    Failed(String),
}

/// Trait for trading policies.
///
/// # Contract
/// `decide` sees only the current state. It must not assume it will be
/// called on every state of a sequence, or only once per state.
pub trait Policy: Send {
    /// Human-readable name (e.g., "threshold").
    fn name(&self) -> &str;

    /// Choose an action for `state`.
    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError> {
        (**self).decide(state)
    }
}

/// Test helper: a state with the given prices and indicator values.
#[cfg(test)]
pub(crate) fn make_state(prices: &[f64], rsi: f64, macd: f64) -> MarketState {
    use crate::domain::{BollingerBands, Indicators};
    let last = prices.last().copied().unwrap_or(100.0);
    MarketState {
        prices: prices.to_vec(),
        indicators: Indicators {
            rsi,
            macd,
            bbands: BollingerBands {
                upper: last * 1.05,
                middle: last,
                lower: last * 0.95,
            },
        },
        volume: 1_000.0,
        timestamp: 1_704_153_600_000,
    }
}
