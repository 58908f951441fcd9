//! Domain types for AgentLab

pub mod account;
pub mod action;
pub mod experience;
pub mod state;
pub mod trade;

pub use account::{Account, Execution, NoOpReason, DEFAULT_BUY_FRACTION};
pub use action::{Action, ActionKind};
pub use experience::{Experience, Reward};
pub use state::{BollingerBands, Indicators, MarketState};
pub use trade::Trade;
