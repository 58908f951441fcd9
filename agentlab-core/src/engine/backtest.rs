//! The backtest loop and its result type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{BacktestError, InvalidInput};
use super::sampler::DailySampler;
use crate::domain::{Account, Action, ActionKind, Execution, MarketState, NoOpReason, Trade};
use crate::metrics::{return_pct, sharpe_ratio, WinTally};
use crate::policy::Policy;

/// Final statistics of one run.
///
/// `return_pct` is the single source of truth for profitability; every other
/// field derives from the same trade log and equity series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub final_balance: f64,
    pub trades: Vec<Trade>,
    pub return_pct: f64,
    pub sharpe_ratio: f64,
    /// Largest `(peak - equity) / peak` over daily samples, as a fraction.
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
}

/// Validated per-bar inputs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BarPoint {
    pub price: f64,
    pub day: NaiveDate,
}

/// Check every precondition up front and extract execution prices and days.
pub(crate) fn prepare(
    states: &[MarketState],
    initial_balance: f64,
) -> Result<Vec<BarPoint>, InvalidInput> {
    if !(initial_balance.is_finite() && initial_balance > 0.0) {
        return Err(InvalidInput::NonPositiveBalance(initial_balance));
    }
    if states.is_empty() {
        return Err(InvalidInput::EmptyStates);
    }

    let mut points = Vec::with_capacity(states.len());
    let mut previous: Option<i64> = None;
    for (index, state) in states.iter().enumerate() {
        let price = state
            .last_price()
            .ok_or(InvalidInput::EmptyPrices { index })?;
        if !(price.is_finite() && price > 0.0) {
            return Err(InvalidInput::InvalidPrice { index, price });
        }
        let day = state.day().ok_or(InvalidInput::TimestampOutOfRange {
            index,
            timestamp: state.timestamp,
        })?;
        if let Some(prev) = previous {
            if state.timestamp < prev {
                return Err(InvalidInput::TimestampOrder {
                    index,
                    timestamp: state.timestamp,
                    previous: prev,
                });
            }
        }
        previous = Some(state.timestamp);
        points.push(BarPoint { price, day });
    }
    Ok(points)
}

/// Ask the policy for a decision and reject malformed actions.
pub(crate) fn decide<P: Policy + ?Sized>(
    policy: &mut P,
    state: &MarketState,
    bar: usize,
) -> Result<Action, BacktestError> {
    let action = policy
        .decide(state)
        .map_err(|source| BacktestError::PolicyFailure { bar, source })?;
    action
        .validate()
        .map_err(|source| BacktestError::PolicyFailure { bar, source })?;
    Ok(action)
}

/// Mutable account, trade log and metric state for one run.
pub(crate) struct Simulation {
    initial_balance: f64,
    account: Account,
    trades: Vec<Trade>,
    sampler: DailySampler,
    tally: WinTally,
    last_buy_price: Option<f64>,
    prev_day: Option<NaiveDate>,
}

impl Simulation {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            account: Account::new(initial_balance),
            trades: Vec::new(),
            sampler: DailySampler::new(initial_balance),
            tally: WinTally::default(),
            last_buy_price: None,
            prev_day: None,
        }
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.account.equity(price)
    }

    /// Execute `action` for bar `index`, then sample equity on a day change.
    pub fn execute(
        &mut self,
        index: usize,
        state: &MarketState,
        point: BarPoint,
        action: Action,
    ) -> Execution {
        let price = point.price;
        let execution = self.account.apply(&action, price);

        match execution {
            Execution::Filled { units, notional } => {
                match action.kind {
                    ActionKind::Buy => self.last_buy_price = Some(price),
                    ActionKind::Sell => {
                        // Sells are judged against the most recent buy only.
                        if let Some(buy_price) = self.last_buy_price {
                            self.tally.record(price > buy_price);
                        }
                    }
                    ActionKind::Hold => {}
                }
                let equity_after = self.account.equity(price);
                debug!(
                    bar = index,
                    kind = %action.kind,
                    price,
                    units,
                    notional,
                    equity_after,
                    "trade executed"
                );
                self.trades.push(Trade {
                    action,
                    price,
                    equity_after,
                    timestamp: state.timestamp,
                });
            }
            Execution::NoOp(NoOpReason::Hold) => {}
            Execution::NoOp(reason) => {
                debug!(bar = index, kind = %action.kind, ?reason, "order skipped");
            }
        }

        if let Some(prev) = self.prev_day {
            if prev != point.day {
                self.sampler.sample(self.account.equity(price));
            }
        }
        self.prev_day = Some(point.day);

        execution
    }

    pub fn finish(self, final_price: f64) -> BacktestResult {
        let final_balance = self.account.equity(final_price);
        BacktestResult {
            final_balance,
            return_pct: return_pct(final_balance, self.initial_balance),
            sharpe_ratio: sharpe_ratio(self.sampler.returns()),
            max_drawdown_pct: self.sampler.max_drawdown(),
            win_rate_pct: self.tally.win_rate_pct(),
            trades: self.trades,
        }
    }
}

/// Run `policy` over `states` starting from `initial_balance` in cash.
///
/// Fails with [`BacktestError::InvalidInput`] before simulating anything if
/// `states` is empty, a state has no (or a non-positive) price, timestamps go
/// backwards, or the balance is not positive. Fails with
/// [`BacktestError::PolicyFailure`] as soon as the policy errors or returns a
/// malformed action. Each call owns its account state, so independent runs
/// may execute concurrently.
pub fn run<P: Policy + ?Sized>(
    policy: &mut P,
    states: &[MarketState],
    initial_balance: f64,
) -> Result<BacktestResult, BacktestError> {
    let points = prepare(states, initial_balance)?;
    let final_price = points
        .last()
        .map(|p| p.price)
        .ok_or(InvalidInput::EmptyStates)?;

    let mut sim = Simulation::new(initial_balance);
    for (index, (state, point)) in states.iter().zip(points.iter()).enumerate() {
        let action = decide(policy, state, index)?;
        sim.execute(index, state, *point, action);
    }

    let result = sim.finish(final_price);
    info!(
        policy = policy.name(),
        bars = states.len(),
        trades = result.trades.len(),
        final_balance = result.final_balance,
        return_pct = result.return_pct,
        "backtest complete"
    );
    Ok(result)
}
