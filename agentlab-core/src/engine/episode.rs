//! Episode rollout: run the engine's accounting and emit one experience per bar.

use tracing::debug;

use super::backtest::{decide, prepare, Simulation};
use super::error::BacktestError;
use crate::domain::{Experience, MarketState, Reward};
use crate::policy::Policy;

/// Roll `policy` over `states` and collect `(s, a, r, s', done)` transitions.
///
/// The reward for bar `i` is the change in equity from bar `i`'s price
/// (before its action) to bar `i + 1`'s price (after it). The last bar is
/// terminal: `next_state == state` and the reward is zero.
///
/// Preconditions and failure modes are those of [`super::run`].
pub fn collect_experiences<P: Policy + ?Sized>(
    policy: &mut P,
    states: &[MarketState],
    initial_balance: f64,
) -> Result<Vec<Experience>, BacktestError> {
    let points = prepare(states, initial_balance)?;
    let mut sim = Simulation::new(initial_balance);
    let mut experiences = Vec::with_capacity(states.len());

    for (index, (state, point)) in states.iter().zip(points.iter()).enumerate() {
        let equity_before = sim.equity(point.price);
        let action = decide(policy, state, index)?;
        sim.execute(index, state, *point, action);

        let experience = match (states.get(index + 1), points.get(index + 1)) {
            (Some(next_state), Some(next_point)) => {
                let pnl = sim.equity(next_point.price) - equity_before;
                let value = if equity_before > 0.0 {
                    pnl / equity_before
                } else {
                    0.0
                };
                Experience {
                    state: state.clone(),
                    action,
                    reward: Reward { value, pnl },
                    next_state: next_state.clone(),
                    done: false,
                }
            }
            _ => Experience {
                state: state.clone(),
                action,
                reward: Reward::default(),
                next_state: state.clone(),
                done: true,
            },
        };
        experiences.push(experience);
    }

    debug!(
        policy = policy.name(),
        experiences = experiences.len(),
        "episode collected"
    );
    Ok(experiences)
}
