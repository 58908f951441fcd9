//! Backtesting engine: bar-by-bar replay of a policy over market states.
//!
//! Per bar, strictly in input order:
//! 1. Execution price = last price of the state
//! 2. Policy decision (validated)
//! 3. Order execution against the account, trade recorded if filled
//! 4. Daily return sampling on calendar-day change (Sharpe, drawdown)

pub mod audit;
pub mod backtest;
pub mod episode;
pub mod error;
pub mod sampler;

pub use audit::replay_trades;
pub use backtest::{run, BacktestResult};
pub use episode::collect_experiences;
pub use error::{BacktestError, InvalidInput};
pub use sampler::DailySampler;
