//! RSI threshold policy: sell overbought, buy oversold.

use super::{Policy, PolicyError};
use crate::domain::{Action, MarketState};

/// `Sell` if RSI > `sell_above`, `Buy` if RSI < `buy_below`, else `Hold`.
///
/// Fully deterministic; the reference policy for engine accounting tests.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    buy_below: f64,
    sell_above: f64,
    name: String,
}

impl ThresholdPolicy {
    pub const DEFAULT_BUY_BELOW: f64 = 30.0;
    pub const DEFAULT_SELL_ABOVE: f64 = 70.0;

    pub fn new(buy_below: f64, sell_above: f64) -> Self {
        assert!(
            buy_below <= sell_above,
            "buy threshold must not exceed sell threshold"
        );
        Self {
            buy_below,
            sell_above,
            name: "threshold".to_string(),
        }
    }

    pub fn buy_below(&self) -> f64 {
        self.buy_below
    }

    pub fn sell_above(&self) -> f64 {
        self.sell_above
    }

    /// The rule itself, shared with agents that fall back to it.
    pub fn rule(&self, state: &MarketState) -> Action {
        let rsi = state.indicators.rsi;
        if rsi > self.sell_above {
            Action::sell()
        } else if rsi < self.buy_below {
            Action::buy()
        } else {
            Action::hold()
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUY_BELOW, Self::DEFAULT_SELL_ABOVE)
    }
}

impl Policy for ThresholdPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError> {
        Ok(self.rule(state))
    }
}
