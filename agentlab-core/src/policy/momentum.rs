//! MACD momentum policy.

use super::{Policy, PolicyError};
use crate::domain::{Action, MarketState};

/// `Buy` when MACD is positive and the last price rose versus the prior bar;
/// `Sell` when MACD is negative and the price fell; otherwise `Hold`.
///
/// A price window with a single entry has no direction and always holds.
#[derive(Debug, Clone)]
pub struct MomentumPolicy {
    name: String,
}

impl MomentumPolicy {
    pub fn new() -> Self {
        Self {
            name: "momentum".to_string(),
        }
    }

    pub fn rule(&self, state: &MarketState) -> Action {
        let (last, prev) = match (state.last_price(), state.previous_price()) {
            (Some(last), Some(prev)) => (last, prev),
            _ => return Action::hold(),
        };
        let macd = state.indicators.macd;

        if macd > 0.0 && last > prev {
            Action::buy()
        } else if macd < 0.0 && last < prev {
            Action::sell()
        } else {
            Action::hold()
        }
    }
}

impl Default for MomentumPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for MomentumPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError> {
        Ok(self.rule(state))
    }
}
