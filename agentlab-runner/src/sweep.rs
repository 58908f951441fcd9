//! Parameter sweep over threshold settings and starting balances.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

use agentlab_core::domain::MarketState;

use crate::config::BacktestConfig;
use crate::runner::{run_with_states, RunReport};

/// Parameter grid specification.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    /// RSI buy thresholds to test
    pub buy_below: Vec<f64>,

    /// RSI sell thresholds to test
    pub sell_above: Vec<f64>,

    /// Initial balances to test
    pub initial_balances: Vec<f64>,
}

impl ParamGrid {
    /// Buy thresholds 20, 25, 30 × sell thresholds 70, 75, 80.
    pub fn threshold_default() -> Self {
        Self {
            buy_below: vec![20.0, 25.0, 30.0],
            sell_above: vec![70.0, 75.0, 80.0],
            initial_balances: vec![10_000.0],
        }
    }

    /// Upper bound on the number of configurations (before skipping invalid pairs).
    pub fn size(&self) -> usize {
        self.buy_below.len() * self.sell_above.len() * self.initial_balances.len()
    }

    /// Generates all valid threshold configurations from `base`.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::new();

        for &buy in &self.buy_below {
            for &sell in &self.sell_above {
                // Skip invalid combinations (buy >= sell)
                if buy >= sell {
                    continue;
                }

                for &balance in &self.initial_balances {
                    let mut config = base.clone();
                    config.policy.policy_type = "threshold".to_string();
                    config.policy.params.clear();
                    config.policy.params.insert("buy_below".to_string(), buy);
                    config.policy.params.insert("sell_above".to_string(), sell);
                    config.backtest.initial_balance = balance;
                    config.training = None;
                    configs.push(config);
                }
            }
        }

        configs
    }
}

/// Parameter sweep executor. Runs every grid point over the same states,
/// optionally in parallel.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base: &BacktestConfig,
        states: &[MarketState],
        dataset_hash: &str,
    ) -> Result<SweepResults> {
        let configs = grid.generate_configs(base);
        let run_one = |config: &BacktestConfig| -> Result<RunReport> {
            let outcome = run_with_states(config, states, dataset_hash).with_context(|| {
                format!("sweep point {:?} failed", config.policy.params)
            })?;
            Ok(outcome.report)
        };

        let reports: Vec<RunReport> = if self.parallel {
            // Parallel execution using Rayon
            configs.par_iter().map(run_one).collect::<Result<Vec<_>>>()?
        } else {
            configs.iter().map(run_one).collect::<Result<Vec<_>>>()?
        };

        info!(
            points = reports.len(),
            parallel = self.parallel,
            "sweep complete"
        );
        Ok(SweepResults::new(reports))
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    reports: Vec<RunReport>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(reports: Vec<RunReport>) -> Self {
        let by_run_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();

        Self { reports, by_run_id }
    }

    pub fn all(&self) -> &[RunReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&RunReport> {
        self.by_run_id.get(run_id).map(|&i| &self.reports[i])
    }

    /// Reports sorted by return (descending); ties keep grid order.
    pub fn sorted_by_return(&self) -> Vec<&RunReport> {
        let mut sorted: Vec<_> = self.reports.iter().collect();
        sorted.sort_by(|a, b| {
            b.result
                .return_pct
                .partial_cmp(&a.result.return_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&RunReport> {
        self.sorted_by_return().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&RunReport> {
        self.sorted_by_return().into_iter().next()
    }
}
