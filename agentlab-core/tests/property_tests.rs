//! Property tests for engine invariants.
//!
//! Uses proptest to verify, for arbitrary price paths and action scripts:
//! 1. Conservation: replaying the trade log reproduces the final balance
//! 2. Solvency: cash and held units never go negative
//! 3. Determinism: identical inputs give byte-identical JSON
//! 4. Metric ranges: win rate in [0, 100], drawdown in [0, 1]

use proptest::prelude::*;

use agentlab_core::domain::{
    Account, Action, ActionKind, BollingerBands, Execution, Indicators, MarketState,
};
use agentlab_core::engine::{replay_trades, run};
use agentlab_core::policy::ScriptedPolicy;

const START_MS: i64 = 1_704_067_200_000;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_action() -> impl Strategy<Value = Action> {
    let kind = prop_oneof![
        Just(ActionKind::Buy),
        Just(ActionKind::Sell),
        Just(ActionKind::Hold),
    ];
    let amount = prop_oneof![Just(None), (0.0..5_000.0_f64).prop_map(Some)];
    (kind, amount).prop_map(|(kind, amount)| Action { kind, amount })
}

/// Bars spaced between 1 hour and 2 days apart.
fn arb_run(max_len: usize) -> impl Strategy<Value = (Vec<MarketState>, Vec<Action>)> {
    prop::collection::vec((arb_price(), 1i64..48, arb_action()), 1..max_len).prop_map(|bars| {
        let mut ts = START_MS;
        let mut states = Vec::with_capacity(bars.len());
        let mut actions = Vec::with_capacity(bars.len());
        for (price, gap_hours, action) in bars {
            states.push(MarketState {
                prices: vec![price],
                indicators: Indicators {
                    rsi: 50.0,
                    macd: 0.0,
                    bbands: BollingerBands {
                        upper: price,
                        middle: price,
                        lower: price,
                    },
                },
                volume: 0.0,
                timestamp: ts,
            });
            actions.push(action);
            ts += gap_hours * 3_600_000;
        }
        (states, actions)
    })
}

// ── 1. Conservation ──────────────────────────────────────────────────

proptest! {
    /// The trade log alone is enough to rebuild the final balance.
    #[test]
    fn trade_log_replay_reproduces_final_balance(
        (states, actions) in arb_run(40),
        balance in 100.0..100_000.0_f64,
    ) {
        let mut policy = ScriptedPolicy::from_actions(&actions);
        let result = run(&mut policy, &states, balance).unwrap();
        let final_price = states.last().unwrap().prices[0];
        let replayed = replay_trades(&result.trades, balance, final_price);
        prop_assert!((replayed - result.final_balance).abs() <= 1e-9 * balance.max(1.0));
    }
}

// ── 2. Solvency ──────────────────────────────────────────────────────

proptest! {
    /// No sequence of orders can overdraw cash or short the position.
    #[test]
    fn account_never_goes_negative(
        orders in prop::collection::vec((arb_action(), arb_price()), 1..60),
    ) {
        let mut account = Account::new(10_000.0);
        for (action, price) in orders {
            let execution = account.apply(&action, price);
            if let Execution::Filled { units, notional } = execution {
                prop_assert!(units >= 0.0);
                prop_assert!(notional > 0.0);
            }
            prop_assert!(account.cash() >= 0.0);
            prop_assert!(account.held_units() >= 0.0);
        }
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn runs_are_deterministic((states, actions) in arb_run(30)) {
        let a = run(&mut ScriptedPolicy::from_actions(&actions), &states, 10_000.0).unwrap();
        let b = run(&mut ScriptedPolicy::from_actions(&actions), &states, 10_000.0).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

// ── 4. Metric ranges ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_stay_in_range((states, actions) in arb_run(40)) {
        let result = run(&mut ScriptedPolicy::from_actions(&actions), &states, 10_000.0).unwrap();
        prop_assert!((0.0..=100.0).contains(&result.win_rate_pct));
        prop_assert!((0.0..=1.0).contains(&result.max_drawdown_pct));
        prop_assert!(result.sharpe_ratio.is_finite());
        prop_assert!(result.final_balance >= 0.0);
        for trade in &result.trades {
            prop_assert!(trade.action.kind != ActionKind::Hold);
        }
    }
}
