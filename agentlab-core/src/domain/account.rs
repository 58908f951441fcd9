//! Account: cash plus a single held asset, mutated only by order execution.

use super::action::{Action, ActionKind};

/// Fraction of current cash spent by a `Buy` without an explicit amount.
pub const DEFAULT_BUY_FRACTION: f64 = 0.2;

/// Outcome of applying one action to the account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Execution {
    /// The order went through: `units` changed hands for `notional` cash.
    Filled { units: f64, notional: f64 },
    /// Nothing changed; no trade is recorded.
    NoOp(NoOpReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    Hold,
    /// Buy sized to zero (no cash, or an explicit zero amount).
    ZeroNotional,
    /// Sell with nothing held.
    NoPosition,
    /// Sell sized to zero units.
    ZeroUnits,
}

/// Account state for one backtest run.
///
/// Invariants: `cash >= 0` and `held_units >= 0` after every execution.
/// `equity(price) == cash + held_units * price`.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    cash: f64,
    held_units: f64,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash: initial_balance,
            held_units: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn held_units(&self) -> f64 {
        self.held_units
    }

    /// Mark-to-market equity at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.held_units * price
    }

    /// Apply `action` at `price`. `price` must be positive.
    pub fn apply(&mut self, action: &Action, price: f64) -> Execution {
        match action.kind {
            ActionKind::Buy => self.buy(action.amount, price),
            ActionKind::Sell => self.sell(action.amount, price),
            ActionKind::Hold => Execution::NoOp(NoOpReason::Hold),
        }
    }

    /// Spend `amount` (default: 20% of cash), clamped to available cash.
    pub fn buy(&mut self, amount: Option<f64>, price: f64) -> Execution {
        let requested = amount.unwrap_or(self.cash * DEFAULT_BUY_FRACTION);
        let notional = requested.min(self.cash);
        if notional <= 0.0 {
            return Execution::NoOp(NoOpReason::ZeroNotional);
        }

        let units = notional / price;
        self.held_units += units;
        if notional == self.cash {
            self.cash = 0.0;
        } else {
            self.cash -= notional;
        }
        Execution::Filled { units, notional }
    }

    /// Sell `amount` worth of units (default: the whole position), clamped
    /// to the units held.
    pub fn sell(&mut self, amount: Option<f64>, price: f64) -> Execution {
        if self.held_units <= 0.0 {
            return Execution::NoOp(NoOpReason::NoPosition);
        }

        let units = match amount {
            Some(a) => (a / price).min(self.held_units),
            None => self.held_units,
        };
        if units <= 0.0 {
            return Execution::NoOp(NoOpReason::ZeroUnits);
        }

        let notional = units * price;
        self.cash += notional;
        if units >= self.held_units {
            self.held_units = 0.0;
        } else {
            self.held_units -= units;
        }
        Execution::Filled { units, notional }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buy_spends_twenty_percent() {
        let mut acct = Account::new(10_000.0);
        let exec = acct.buy(None, 100.0);
        assert_eq!(
            exec,
            Execution::Filled {
                units: 20.0,
                notional: 2_000.0
            }
        );
        assert_eq!(acct.cash(), 8_000.0);
        assert_eq!(acct.held_units(), 20.0);
        assert_eq!(acct.equity(100.0), 10_000.0);
    }

    #[test]
    fn oversized_buy_clamps_to_cash() {
        let mut acct = Account::new(1_000.0);
        let exec = acct.buy(Some(5_000.0), 50.0);
        assert_eq!(
            exec,
            Execution::Filled {
                units: 20.0,
                notional: 1_000.0
            }
        );
        assert_eq!(acct.cash(), 0.0);
    }

    #[test]
    fn buy_without_cash_is_noop() {
        let mut acct = Account::new(1_000.0);
        acct.buy(Some(1_000.0), 10.0);
        assert_eq!(
            acct.buy(None, 10.0),
            Execution::NoOp(NoOpReason::ZeroNotional)
        );
        assert_eq!(
            acct.buy(Some(0.0), 10.0),
            Execution::NoOp(NoOpReason::ZeroNotional)
        );
    }

    #[test]
    fn sell_without_position_is_noop() {
        let mut acct = Account::new(1_000.0);
        assert_eq!(acct.sell(None, 10.0), Execution::NoOp(NoOpReason::NoPosition));
        assert_eq!(acct.cash(), 1_000.0);
    }

    #[test]
    fn oversized_sell_liquidates_exactly() {
        let mut acct = Account::new(1_000.0);
        acct.buy(Some(500.0), 10.0); // 50 units
        let exec = acct.sell(Some(10_000.0), 12.0);
        assert_eq!(
            exec,
            Execution::Filled {
                units: 50.0,
                notional: 600.0
            }
        );
        assert_eq!(acct.held_units(), 0.0);
        assert_eq!(acct.cash(), 1_100.0);
    }

    #[test]
    fn partial_sell_keeps_remainder() {
        let mut acct = Account::new(1_000.0);
        acct.buy(Some(500.0), 10.0); // 50 units
        acct.sell(Some(200.0), 10.0); // 20 units
        assert_eq!(acct.held_units(), 30.0);
        assert_eq!(acct.cash(), 700.0);
    }

    #[test]
    fn zero_amount_sell_is_noop() {
        let mut acct = Account::new(1_000.0);
        acct.buy(None, 10.0);
        assert_eq!(
            acct.sell(Some(0.0), 10.0),
            Execution::NoOp(NoOpReason::ZeroUnits)
        );
    }

    #[test]
    fn hold_changes_nothing() {
        let mut acct = Account::new(1_000.0);
        let before = acct.clone();
        assert_eq!(
            acct.apply(&Action::hold(), 10.0),
            Execution::NoOp(NoOpReason::Hold)
        );
        assert_eq!(acct, before);
    }
}
