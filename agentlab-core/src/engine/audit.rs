//! Trade-log audit: rebuild account equity from the trade log alone.

use crate::domain::{Account, Trade};

/// Re-apply every logged trade to a fresh account and mark the result at
/// `final_price`.
///
/// Trades carry the action as issued, so the same clamping rules reproduce
/// the engine's fills exactly; no-op decisions never reach the log and never
/// touched the account. For any successful run this equals `final_balance`.
pub fn replay_trades(trades: &[Trade], initial_balance: f64, final_price: f64) -> f64 {
    let mut account = Account::new(initial_balance);
    for trade in trades {
        account.apply(&trade.action, trade.price);
    }
    account.equity(final_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;

    #[test]
    fn empty_log_is_initial_balance() {
        assert_eq!(replay_trades(&[], 1_000.0, 55.0), 1_000.0);
    }

    #[test]
    fn replays_clamped_orders() {
        let trades = vec![
            Trade {
                action: Action::buy().with_amount(5_000.0),
                price: 10.0,
                equity_after: 1_000.0,
                timestamp: 0,
            },
            Trade {
                action: Action::sell().with_amount(500.0),
                price: 20.0,
                equity_after: 2_000.0,
                timestamp: 1,
            },
        ];
        // 100 units bought with all 1000; 25 sold for 500; 75 left at 30
        assert_eq!(replay_trades(&trades, 1_000.0, 30.0), 500.0 + 75.0 * 30.0);
    }
}
