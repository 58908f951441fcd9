//! BDD tests for the runner: config-driven runs, artifacts, training and sweeps.

use std::path::{Path, PathBuf};

use agentlab_core::synthetic::random_walk_bars;
use agentlab_runner::{
    export_bars_csv, load_artifacts, load_states, run_single_backtest, save_artifacts,
    BacktestConfig, ParamGrid, ParamSweep, SCHEMA_VERSION,
};

fn write_bars(dir: &Path, seed: u64, n: usize) -> PathBuf {
    let bars = random_walk_bars(seed, n, 1_704_067_200_000, 86_400_000, 100.0);
    let path = dir.join("bars.csv");
    std::fs::write(&path, export_bars_csv(&bars).unwrap()).unwrap();
    path
}

fn config_for(data: &Path, policy: &str, extra: &str) -> BacktestConfig {
    let toml = format!(
        "seed = 3\n\n[backtest]\ndata = {data:?}\ninitial_balance = 10000.0\n\n[policy]\ntype = \"{policy}\"\n{extra}",
        data = data.display().to_string(),
    );
    BacktestConfig::from_toml(&toml).unwrap()
}

#[test]
fn bdd_scenario_run_threshold_policy_from_csv() {
    // GIVEN a CSV of daily bars and a threshold config pointing at it
    let dir = tempfile::tempdir().unwrap();
    let data = write_bars(dir.path(), 1, 200);
    let config = config_for(&data, "threshold", "");

    // WHEN the runner executes the backtest
    let outcome = run_single_backtest(&config).expect("Backtest should succeed");
    let report = outcome.report;

    // THEN the report covers every post-warmup bar
    assert_eq!(report.schema_version, SCHEMA_VERSION);
    assert_eq!(report.policy, "threshold");
    assert_eq!(report.bar_count, 200 - 25);
    assert!(report.result.final_balance > 0.0);

    // AND the run id binds the config to the dataset
    let loaded = load_states(&data, &config.feed).unwrap();
    assert_eq!(report.dataset_hash, loaded.dataset_hash);
    assert_eq!(report.run_id, config.run_id(&loaded.dataset_hash));
}

#[test]
fn bdd_scenario_artifacts_roundtrip() {
    // GIVEN a completed run
    let dir = tempfile::tempdir().unwrap();
    let data = write_bars(dir.path(), 2, 120);
    let report = run_single_backtest(&config_for(&data, "momentum", ""))
        .unwrap()
        .report;

    // WHEN artifacts are saved
    let out = dir.path().join("results");
    let run_dir = save_artifacts(&report, &out).unwrap();

    // THEN they live under the run id and load back unchanged
    assert_eq!(run_dir, out.join(&report.run_id));
    let trades_csv = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), report.result.trades.len() + 1);
    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.dataset_hash, report.dataset_hash);
    assert_eq!(loaded.result.trades.len(), report.result.trades.len());
    assert!((loaded.result.final_balance - report.result.final_balance).abs() < 1e-6);
}

#[test]
fn bdd_scenario_repeat_runs_are_byte_identical() {
    // GIVEN one config with a trainable policy
    let dir = tempfile::tempdir().unwrap();
    let data = write_bars(dir.path(), 3, 150);
    let config = config_for(
        &data,
        "dqn",
        "[policy.params]\nbatch_size = 32\n\n[training]\nepisodes = 2\n",
    );

    // WHEN it runs twice
    let a = run_single_backtest(&config).unwrap();
    let b = run_single_backtest(&config).unwrap();

    // THEN training and results match exactly
    assert_eq!(a.training, b.training);
    assert_eq!(
        serde_json::to_string(&a.report).unwrap(),
        serde_json::to_string(&b.report).unwrap()
    );
}

#[test]
fn bdd_scenario_sweep_ranks_by_return() {
    // GIVEN loaded states and the default threshold grid
    let dir = tempfile::tempdir().unwrap();
    let data = write_bars(dir.path(), 4, 250);
    let base = config_for(&data, "threshold", "");
    let loaded = load_states(&data, &base.feed).unwrap();

    // WHEN the sweep runs
    let results = ParamSweep::new()
        .sweep(
            &ParamGrid::threshold_default(),
            &base,
            &loaded.states,
            &loaded.dataset_hash,
        )
        .expect("Sweep should succeed");

    // THEN every grid point has a distinct report, best first
    assert_eq!(results.len(), 9);
    let ranked = results.sorted_by_return();
    for pair in ranked.windows(2) {
        assert!(pair[0].result.return_pct >= pair[1].result.return_pct);
    }
    let best = results.best().unwrap();
    assert_eq!(results.get(&best.run_id), Some(best));
}
