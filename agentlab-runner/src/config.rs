//! TOML backtest configuration.
//!
//! ```toml
//! seed = 42
//!
//! [backtest]
//! data = "data/btc_daily.csv"
//! initial_balance = 10000.0
//!
//! [policy]
//! type = "threshold"
//!
//! [policy.params]
//! buy_below = 30.0
//! sell_above = 70.0
//!
//! [feed]          # optional, CSV inputs only
//! window = 10
//!
//! [training]      # optional, dqn/ppo only
//! episodes = 20
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use agentlab_core::feed::{FeedConfig, FeedError};
use agentlab_core::policy::{create_policy, FactoryError, PolicyConfig};

use crate::training::TrainingConfig;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("initial_balance must be finite and positive, got {0}")]
    InvalidBalance(f64),
    #[error("policy: {0}")]
    Policy(#[from] FactoryError),
    #[error("feed: {0}")]
    Feed(#[from] FeedError),
    #[error("[training] requires a trainable policy, got '{0}'")]
    NotTrainable(String),
    #[error("[training] episodes must be at least 1")]
    ZeroEpisodes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// `.json` (array of market states) or `.csv` (`timestamp,close,volume`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    pub initial_balance: f64,
}

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Master seed for every RNG the run touches.
    #[serde(default)]
    pub seed: u64,
    pub backtest: BacktestSection,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingConfig>,
}

impl BacktestConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let balance = self.backtest.initial_balance;
        if !(balance.is_finite() && balance > 0.0) {
            return Err(ConfigError::InvalidBalance(balance));
        }
        create_policy(&self.policy, self.seed)?;
        self.feed.validate()?;
        if let Some(training) = &self.training {
            if !self.policy.is_trainable() {
                return Err(ConfigError::NotTrainable(self.policy.policy_type.clone()));
            }
            if training.episodes == 0 {
                return Err(ConfigError::ZeroEpisodes);
            }
        }
        Ok(())
    }

    /// Content-addressed id of this config applied to a dataset.
    ///
    /// Hashes every field that affects the result (the data path does not;
    /// the dataset hash stands in for it).
    pub fn run_id(&self, dataset_hash: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(&self.backtest.initial_balance.to_le_bytes());

        hasher.update(self.policy.policy_type.as_bytes());
        for (name, value) in &self.policy.params {
            hasher.update(name.as_bytes());
            hasher.update(&value.to_le_bytes());
        }

        let feed = &self.feed;
        for period in [
            feed.window,
            feed.rsi_period,
            feed.macd_fast,
            feed.macd_slow,
            feed.bollinger_period,
        ] {
            hasher.update(&(period as u64).to_le_bytes());
        }
        hasher.update(&feed.bollinger_multiplier.to_le_bytes());

        if let Some(training) = &self.training {
            hasher.update(b"training");
            hasher.update(&(training.episodes as u64).to_le_bytes());
            if let Some(bars) = training.synthetic_bars {
                hasher.update(&(bars as u64).to_le_bytes());
            }
        }

        hasher.update(dataset_hash.as_bytes());
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..16].to_string()
    }
}
