//! Backtest runner: wires together config, data, training, and the engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads states from the config's data path, then runs. Used by CLI.
//! - `run_with_states()`: takes pre-loaded states. Used by sweeps and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use agentlab_core::domain::MarketState;
use agentlab_core::engine::{run, BacktestError, BacktestResult};
use agentlab_core::policy::{create_policy, create_trainable, FactoryError};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_states, LoadError};
use crate::training::{train_agent, TrainError, TrainingReport};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("policy error: {0}")]
    Policy(#[from] FactoryError),
    #[error("training error: {0}")]
    Training(#[from] TrainError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("config has no [backtest] data path")]
    MissingData,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub policy: String,
    pub bar_count: usize,
    pub dataset_hash: String,
    pub result: BacktestResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A report plus the training summary, when the run trained first.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub training: Option<TrainingReport>,
}

/// Run a single backtest from a config (loads states from `[backtest] data`).
pub fn run_single_backtest(config: &BacktestConfig) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let path = config.backtest.data.as_deref().ok_or(RunError::MissingData)?;
    let loaded = load_states(path, &config.feed)?;
    run_with_states(config, &loaded.states, &loaded.dataset_hash)
}

/// Run a backtest over pre-loaded states: no I/O.
///
/// When the config has a `[training]` section the policy is trained first
/// and the trained parameters are the ones evaluated.
pub fn run_with_states(
    config: &BacktestConfig,
    states: &[MarketState],
    dataset_hash: &str,
) -> Result<RunOutcome, RunError> {
    let balance = config.backtest.initial_balance;
    let run_id = config.run_id(dataset_hash);

    let (policy_name, result, training) = match &config.training {
        Some(training_config) => {
            let mut agent = create_trainable(&config.policy, config.seed)?;
            let training = train_agent(
                agent.as_mut(),
                training_config,
                states,
                &config.feed,
                balance,
                config.seed,
            )?;
            let result = run(&mut agent, states, balance)?;
            (agent.name().to_string(), result, Some(training))
        }
        None => {
            let mut policy = create_policy(&config.policy, config.seed)?;
            let result = run(&mut policy, states, balance)?;
            (policy.name().to_string(), result, None)
        }
    };

    info!(
        run_id = %run_id,
        policy = %policy_name,
        return_pct = result.return_pct,
        sharpe = result.sharpe_ratio,
        "run complete"
    );

    Ok(RunOutcome {
        report: RunReport {
            schema_version: SCHEMA_VERSION,
            run_id,
            policy: policy_name,
            bar_count: states.len(),
            dataset_hash: dataset_hash.to_string(),
            result,
        },
        training,
    })
}
