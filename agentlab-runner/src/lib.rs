//! AgentLab Runner: backtest orchestration on top of `agentlab-core`.
//!
//! This crate provides:
//! - TOML configuration with validation and content-addressed run ids
//! - State loading from JSON states or CSV bars, with dataset hashing
//! - Training loops for trainable policies
//! - Single-run execution and parallel parameter sweeps
//! - JSON/CSV artifact export with schema versioning

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;
pub mod training;

pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{compute_dataset_hash, load_states, DataFormat, LoadError, LoadedData};
pub use export::{
    export_bars_csv, export_json, export_trades_csv, import_json, load_artifacts, load_params,
    save_artifacts, save_params,
};
pub use runner::{run_single_backtest, run_with_states, RunError, RunOutcome, RunReport, SCHEMA_VERSION};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
pub use training::{train_agent, TrainError, TrainingConfig, TrainingReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<TrainingConfig>();
        assert_sync::<TrainingConfig>();
    }

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }

    #[test]
    fn param_grid_is_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }
}
