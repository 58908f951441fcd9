//! AgentLab CLI: backtest, sweep, train and synthetic-data commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file or named preset
//! - `sweep`: grid-search threshold settings over one dataset
//! - `train`: train a DQN/PPO agent on synthetic episodes and evaluate it
//! - `synth`: write a seeded random-walk bar file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use toml::{Table, Value};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use agentlab_core::agent::AgentKind;
use agentlab_core::engine::run;
use agentlab_core::feed::{build_states, FeedConfig};
use agentlab_core::policy::{create_trainable, PolicyConfig};
use agentlab_core::rng::RngHierarchy;
use agentlab_core::synthetic::random_walk_bars;
use agentlab_runner::{
    export_bars_csv, load_params, load_states, run_single_backtest, save_artifacts, save_params,
    train_agent, BacktestConfig, ParamGrid, ParamSweep, RunReport, TrainingConfig,
};

const DAY_MS: i64 = 86_400_000;

#[derive(Parser)]
#[command(
    name = "agentlab",
    about = "AgentLab CLI: trading-policy backtester with trainable agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file or named preset.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: rsi_threshold, rsi_wide, momentum, dqn, ppo.
        #[arg(long)]
        preset: Option<String>,

        /// Data file (.json states or .csv bars). Required with --preset.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Initial balance for presets.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        /// Master seed for presets.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Grid-search RSI thresholds over one dataset.
    Sweep {
        /// Data file (.json states or .csv bars).
        #[arg(long)]
        data: PathBuf,

        /// Initial balance.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        /// Run grid points one at a time.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Number of top results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Train an agent on synthetic episodes, then evaluate it on a fresh walk.
    Train {
        /// Agent type: dqn or ppo.
        #[arg(long, default_value = "dqn")]
        agent: String,

        /// Training episodes.
        #[arg(long, default_value_t = 20)]
        episodes: usize,

        /// Bars per synthetic episode.
        #[arg(long, default_value_t = 250)]
        bars: usize,

        /// Master seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Initial balance for episodes and evaluation.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        /// Start from parameters saved by a previous run.
        #[arg(long)]
        init: Option<PathBuf>,

        /// Write the trained parameters here.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Write a seeded random-walk bar file (timestamp,close,volume).
    Synth {
        /// Number of bars.
        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First bar date (YYYY-MM-DD, UTC midnight).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Starting close price.
        #[arg(long, default_value_t = 100.0)]
        start_price: f64,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            preset,
            data,
            balance,
            seed,
            output_dir,
            json,
        } => run_backtest_cmd(config, preset, data, balance, seed, output_dir, json),
        Commands::Sweep {
            data,
            balance,
            serial,
            top,
        } => run_sweep_cmd(data, balance, serial, top),
        Commands::Train {
            agent,
            episodes,
            bars,
            seed,
            balance,
            init,
            save,
        } => run_train_cmd(&agent, episodes, bars, seed, balance, init, save),
        Commands::Synth {
            bars,
            seed,
            start,
            start_price,
            output,
        } => run_synth_cmd(bars, seed, &start, start_price, output),
    }
}

/// Structured logs to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agentlab_core=info,agentlab_runner=info,agentlab=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr).compact())
        .init();
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    data: Option<PathBuf>,
    balance: f64,
    seed: u64,
    output_dir: PathBuf,
    json: bool,
) -> Result<()> {
    let backtest_config = match (config_path, preset_name) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (None, None) => bail!("one of --config or --preset is required"),
        (Some(path), None) => {
            let mut config = BacktestConfig::from_file(&path)?;
            if let Some(data) = data {
                config.backtest.data = Some(data);
            }
            config
        }
        (None, Some(name)) => {
            let Some(data) = data else {
                bail!("--data is required with --preset");
            };
            build_config_from_preset(&name, &data, balance, seed)?
        }
    };

    let outcome = run_single_backtest(&backtest_config)?;

    if let Some(training) = &outcome.training {
        println!(
            "Trained {} episodes ({} experiences), final loss {:.6}",
            training.episodes,
            training.experiences,
            training.final_loss().unwrap_or(0.0)
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_summary(&outcome.report);
    }

    let run_dir = save_artifacts(&outcome.report, &output_dir)?;
    info!(path = %run_dir.display(), "artifacts saved");
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn build_config_from_preset(
    name: &str,
    data: &std::path::Path,
    balance: f64,
    seed: u64,
) -> Result<BacktestConfig> {
    let (policy_type, params, training): (&str, &[(&str, f64)], Option<(i64, i64)>) = match name {
        "rsi_threshold" => ("threshold", &[("buy_below", 30.0), ("sell_above", 70.0)], None),
        "rsi_wide" => ("threshold", &[("buy_below", 20.0), ("sell_above", 80.0)], None),
        "momentum" => ("momentum", &[], None),
        "dqn" => ("dqn", &[("batch_size", 64.0)], Some((20, 250))),
        "ppo" => ("ppo", &[("clip_epsilon", 0.2)], Some((20, 250))),
        _ => bail!("unknown preset '{name}'. Valid: rsi_threshold, rsi_wide, momentum, dqn, ppo"),
    };

    let mut table = base_table(seed, balance, policy_type, params)?;
    if let Some(Value::Table(backtest)) = table.get_mut("backtest") {
        backtest.insert(
            "data".into(),
            Value::String(data.display().to_string()),
        );
    }
    if let Some((episodes, bars)) = training {
        let mut section = Table::new();
        section.insert("episodes".into(), Value::Integer(episodes));
        section.insert("synthetic_bars".into(), Value::Integer(bars));
        table.insert("training".into(), Value::Table(section));
    }

    config_from_table(&table)
}

/// `[backtest]` and `[policy]` sections shared by presets and sweeps.
fn base_table(
    seed: u64,
    balance: f64,
    policy_type: &str,
    params: &[(&str, f64)],
) -> Result<Table> {
    let seed = i64::try_from(seed).with_context(|| format!("--seed {seed} is too large"))?;

    let mut backtest = Table::new();
    backtest.insert("initial_balance".into(), Value::Float(balance));

    let mut policy = Table::new();
    policy.insert("type".into(), Value::String(policy_type.into()));
    if !params.is_empty() {
        let params: Table = params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Float(*v)))
            .collect();
        policy.insert("params".into(), Value::Table(params));
    }

    let mut table = Table::new();
    table.insert("seed".into(), Value::Integer(seed));
    table.insert("backtest".into(), Value::Table(backtest));
    table.insert("policy".into(), Value::Table(policy));
    Ok(table)
}

/// Presets go through the same TOML parse and validation as config files.
fn config_from_table(table: &Table) -> Result<BacktestConfig> {
    let text = toml::to_string(table).context("failed to render preset config")?;
    Ok(BacktestConfig::from_toml(&text)?)
}

fn run_sweep_cmd(data: PathBuf, balance: f64, serial: bool, top: usize) -> Result<()> {
    let base = config_from_table(&base_table(0, balance, "threshold", &[])?)?;
    let loaded = load_states(&data, &base.feed)?;

    let mut grid = ParamGrid::threshold_default();
    grid.initial_balances = vec![balance];

    // Reports carry only the policy name; key the thresholds by run id.
    let thresholds: HashMap<String, (f64, f64)> = grid
        .generate_configs(&base)
        .iter()
        .map(|config| {
            let param = |name: &str| config.policy.params.get(name).copied().unwrap_or(f64::NAN);
            (
                config.run_id(&loaded.dataset_hash),
                (param("buy_below"), param("sell_above")),
            )
        })
        .collect();

    let results = ParamSweep::new().with_parallelism(!serial).sweep(
        &grid,
        &base,
        &loaded.states,
        &loaded.dataset_hash,
    )?;

    println!();
    println!("=== Sweep ({} points, {} bars) ===", results.len(), loaded.states.len());
    println!(
        "{:<18} {:>6} {:>6} {:>10} {:>8} {:>8} {:>7}",
        "Run", "Buy<", "Sell>", "Return%", "Sharpe", "MaxDD%", "Trades"
    );
    println!("{}", "-".repeat(70));
    for report in results.top_n(top) {
        let (buy, sell) = thresholds
            .get(&report.run_id)
            .copied()
            .unwrap_or((f64::NAN, f64::NAN));
        println!(
            "{:<18} {:>6.1} {:>6.1} {:>10.2} {:>8.3} {:>8.2} {:>7}",
            report.run_id,
            buy,
            sell,
            report.result.return_pct,
            report.result.sharpe_ratio,
            report.result.max_drawdown_pct * 100.0,
            report.result.trades.len()
        );
    }
    Ok(())
}

fn run_train_cmd(
    agent_name: &str,
    episodes: usize,
    bars: usize,
    seed: u64,
    balance: f64,
    init: Option<PathBuf>,
    save: Option<PathBuf>,
) -> Result<()> {
    let kind: AgentKind = agent_name.parse()?;
    let feed = FeedConfig::default();
    let mut agent = create_trainable(&PolicyConfig::new(kind.as_str()), seed)?;

    if let Some(path) = &init {
        agent.load(&load_params(path)?)?;
        info!(path = %path.display(), "parameters loaded");
    }

    let training = TrainingConfig {
        episodes,
        synthetic_bars: Some(bars),
    };
    let report = train_agent(agent.as_mut(), &training, &[], &feed, balance, seed)?;

    // Evaluate on a walk no episode has seen.
    let eval_seed = RngHierarchy::new(seed).sub_seed("evaluation", 0);
    let eval_bars = random_walk_bars(eval_seed, bars, 1_577_836_800_000, DAY_MS, 100.0);
    let eval_states = build_states(&eval_bars, &feed)?;
    let result = run(&mut agent, &eval_states, balance)?;

    println!();
    println!("=== Training ({kind}) ===");
    println!("Episodes:       {}", report.episodes);
    println!("Experiences:    {}", report.experiences);
    println!("Final loss:     {:.6}", report.final_loss().unwrap_or(0.0));
    println!();
    println!("--- Evaluation ({} bars) ---", eval_states.len());
    println!("Final Balance:  {:.2}", result.final_balance);
    println!("Return:         {:.2}%", result.return_pct);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown_pct * 100.0);
    println!("Win Rate:       {:.1}%", result.win_rate_pct);

    if let Some(path) = &save {
        save_params(&agent.save(), path)?;
        println!("Parameters saved to: {}", path.display());
    }
    Ok(())
}

fn run_synth_cmd(
    bars: usize,
    seed: u64,
    start: &str,
    start_price: f64,
    output: PathBuf,
) -> Result<()> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}'"))?;
    let start_ms = start_date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .context("invalid start time")?;
    if !(start_price.is_finite() && start_price > 0.0) {
        bail!("--start-price must be positive, got {start_price}");
    }

    let walk = random_walk_bars(seed, bars, start_ms, DAY_MS, start_price);
    std::fs::write(&output, export_bars_csv(&walk)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} bars to {}", walk.len(), output.display());
    Ok(())
}

fn print_summary(report: &RunReport) {
    let result = &report.result;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", report.run_id);
    println!("Policy:         {}", report.policy);
    println!("Bars:           {}", report.bar_count);
    println!("Dataset Hash:   {}", report.dataset_hash);
    println!("Trades:         {}", result.trades.len());
    println!();
    println!("--- Performance ---");
    println!("Final Balance:  {:.2}", result.final_balance);
    println!("Return:         {:.2}%", result.return_pct);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown_pct * 100.0);
    println!("Win Rate:       {:.1}%", result.win_rate_pct);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlab_runner::ConfigError;
    use std::path::Path;

    fn config_error(err: anyhow::Error) -> ConfigError {
        err.downcast::<ConfigError>()
            .expect("preset failure should be a config error")
    }

    #[test]
    fn preset_keeps_control_characters_in_data_path() {
        let path = Path::new("data/odd\u{1}name \"quoted\".csv");
        let config = build_config_from_preset("rsi_threshold", path, 10_000.0, 7).unwrap();
        assert_eq!(config.backtest.data.as_deref(), Some(path));
        assert_eq!(config.seed, 7);
        assert_eq!(config.policy.params.get("sell_above"), Some(&70.0));
    }

    #[test]
    fn preset_nan_balance_is_a_validation_error() {
        let err = build_config_from_preset("momentum", Path::new("x.csv"), f64::NAN, 1).unwrap_err();
        assert!(matches!(config_error(err), ConfigError::InvalidBalance(b) if b.is_nan()));
    }

    #[test]
    fn preset_negative_balance_is_a_validation_error() {
        let err = build_config_from_preset("momentum", Path::new("x.csv"), -5.0, 1).unwrap_err();
        assert!(matches!(config_error(err), ConfigError::InvalidBalance(b) if b == -5.0));
    }

    #[test]
    fn trainable_presets_carry_training_section() {
        let config = build_config_from_preset("dqn", Path::new("x.csv"), 1_000.0, 3).unwrap();
        let training = config.training.expect("dqn preset trains");
        assert_eq!(training.episodes, 20);
        assert_eq!(training.synthetic_bars, Some(250));
    }

    #[test]
    fn unknown_preset_rejected() {
        assert!(build_config_from_preset("oracle", Path::new("x.csv"), 1_000.0, 0).is_err());
    }
}
