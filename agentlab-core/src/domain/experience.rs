//! Reward and Experience: the transition records trainable policies learn from.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::state::MarketState;

/// Equity change over one step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reward {
    /// Fractional change: `pnl / equity_before`.
    pub value: f64,
    /// Absolute change in account equity.
    pub pnl: f64,
}

/// One `(state, action, reward, next_state, done)` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub state: MarketState,
    pub action: Action,
    pub reward: Reward,
    pub next_state: MarketState,
    pub done: bool,
}
