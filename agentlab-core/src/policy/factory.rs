//! Factory: converts a `PolicyConfig` into a runtime policy object.
//!
//! `create_policy` covers every known type; `create_trainable` covers the
//! subset that implements [`TrainablePolicy`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{MomentumPolicy, Policy, ThresholdPolicy};
use crate::agent::{DqnAgent, DqnConfig, PpoAgent, PpoConfig, TrainablePolicy};

/// Serializable policy description: a type name plus numeric parameters.
///
/// `params` is a `BTreeMap` so iteration (and therefore hashing into a run id)
/// is ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl PolicyConfig {
    pub fn new(policy_type: &str) -> Self {
        Self {
            policy_type: policy_type.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn is_trainable(&self) -> bool {
        matches!(self.policy_type.as_str(), "dqn" | "ppo")
    }
}

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown policy type: {0}")]
    UnknownPolicy(String),
    #[error("Policy type '{0}' is not trainable")]
    NotTrainable(String),
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParam {
        name: String,
        value: f64,
        reason: &'static str,
    },
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn param(config: &PolicyConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = config.params.get(name).copied().unwrap_or(default);
    if !value.is_finite() {
        return Err(invalid(name, value, "must be finite"));
    }
    Ok(value)
}

fn param_usize(config: &PolicyConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    match config.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
        Some(v) => Err(invalid(name, v, "must be a positive integer")),
    }
}

fn param_unit(config: &PolicyConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = param(config, name, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(name, value, "must be within [0, 1]"));
    }
    Ok(value)
}

fn invalid(name: &str, value: f64, reason: &'static str) -> FactoryError {
    FactoryError::InvalidParam {
        name: name.to_string(),
        value,
        reason,
    }
}

fn threshold(config: &PolicyConfig) -> Result<ThresholdPolicy, FactoryError> {
    let buy_below = param(config, "buy_below", ThresholdPolicy::DEFAULT_BUY_BELOW)?;
    let sell_above = param(config, "sell_above", ThresholdPolicy::DEFAULT_SELL_ABOVE)?;
    if buy_below > sell_above {
        return Err(invalid("buy_below", buy_below, "must not exceed sell_above"));
    }
    Ok(ThresholdPolicy::new(buy_below, sell_above))
}

fn dqn(config: &PolicyConfig, seed: u64) -> Result<DqnAgent, FactoryError> {
    let defaults = DqnConfig::default();
    let dqn_config = DqnConfig {
        learning_rate: param(config, "learning_rate", defaults.learning_rate)?,
        discount: param_unit(config, "discount", defaults.discount)?,
        epsilon_start: param_unit(config, "epsilon", defaults.epsilon_start)?,
        epsilon_min: param_unit(config, "epsilon_min", defaults.epsilon_min)?,
        epsilon_decay: param_unit(config, "epsilon_decay", defaults.epsilon_decay)?,
        batch_size: param_usize(config, "batch_size", defaults.batch_size)?,
        buffer_capacity: param_usize(config, "buffer_capacity", defaults.buffer_capacity)?,
    };
    Ok(DqnAgent::new(dqn_config, seed))
}

fn ppo(config: &PolicyConfig) -> Result<PpoAgent, FactoryError> {
    let defaults = PpoConfig::default();
    let ppo_config = PpoConfig {
        learning_rate: param(config, "learning_rate", defaults.learning_rate)?,
        discount: param_unit(config, "discount", defaults.discount)?,
        clip_epsilon: param(config, "clip_epsilon", defaults.clip_epsilon)?,
    };
    Ok(PpoAgent::new(ppo_config))
}

// ─── Factories ───────────────────────────────────────────────────────

/// Create a policy from a `PolicyConfig`. `seed` drives any internal RNG.
pub fn create_policy(config: &PolicyConfig, seed: u64) -> Result<Box<dyn Policy>, FactoryError> {
    match config.policy_type.as_str() {
        "threshold" => Ok(Box::new(threshold(config)?)),
        "momentum" => Ok(Box::new(MomentumPolicy::new())),
        "dqn" => Ok(Box::new(dqn(config, seed)?)),
        "ppo" => Ok(Box::new(ppo(config)?)),
        other => Err(FactoryError::UnknownPolicy(other.to_string())),
    }
}

/// Create a trainable policy (`dqn` or `ppo`) from a `PolicyConfig`.
pub fn create_trainable(
    config: &PolicyConfig,
    seed: u64,
) -> Result<Box<dyn TrainablePolicy>, FactoryError> {
    match config.policy_type.as_str() {
        "dqn" => Ok(Box::new(dqn(config, seed)?)),
        "ppo" => Ok(Box::new(ppo(config)?)),
        "threshold" | "momentum" => Err(FactoryError::NotTrainable(config.policy_type.clone())),
        other => Err(FactoryError::UnknownPolicy(other.to_string())),
    }
}
