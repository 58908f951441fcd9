//! Trainable policies: agents that learn from experience.
//!
//! Both agents keep their learnable state as flat `f64` arrays so that
//! `save`/`load` round-trip through a [`ParamBlob`]. The learning rules are
//! deliberately small (linear function approximation); what matters to the
//! rest of the system is the `TrainablePolicy` seam, not the model inside.

pub mod dqn;
pub mod features;
pub mod ppo;
pub mod replay;

pub use dqn::{DqnAgent, DqnConfig};
pub use features::{state_features, Features, N_FEATURES};
pub use ppo::{PpoAgent, PpoConfig};
pub use replay::{ReplayBuffer, DEFAULT_REPLAY_CAPACITY};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Experience;
use crate::policy::Policy;

/// Errors from training or restoring an agent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("parameter blob has {actual} values, expected {expected}")]
    BlobLength { expected: usize, actual: usize },
    #[error("parameter blob byte length {0} is not a multiple of 8")]
    MalformedBytes(usize),
    #[error("parameter blob contains a non-finite value at index {0}")]
    NonFinite(usize),
    #[error("exploration rate {0} is outside [0, 1]")]
    InvalidEpsilon(f64),
    #[error("unknown agent type '{0}' (expected 'dqn' or 'ppo')")]
    UnknownAgent(String),
}

/// Flat parameter array: the persisted form of a trainable policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamBlob(pub Vec<f64>);

impl ParamBlob {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Little-endian `f64` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AgentError> {
        if bytes.len() % 8 != 0 {
            return Err(AgentError::MalformedBytes(bytes.len()));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect();
        Ok(Self(values))
    }

    /// Length and finiteness check shared by the agents' `load`.
    pub(crate) fn expect_len(&self, expected: usize) -> Result<&[f64], AgentError> {
        if self.0.len() != expected {
            return Err(AgentError::BlobLength {
                expected,
                actual: self.0.len(),
            });
        }
        if let Some(idx) = self.0.iter().position(|v| !v.is_finite()) {
            return Err(AgentError::NonFinite(idx));
        }
        Ok(&self.0)
    }
}

/// A policy whose parameters can be learned and persisted.
pub trait TrainablePolicy: Policy {
    /// Learn from a batch of experiences; returns the training loss.
    fn train(&mut self, experiences: &[Experience]) -> Result<f64, AgentError>;

    fn save(&self) -> ParamBlob;

    fn load(&mut self, blob: &ParamBlob) -> Result<(), AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Dqn,
    Ppo,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Dqn => "dqn",
            AgentKind::Ppo => "ppo",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dqn" => Ok(AgentKind::Dqn),
            "ppo" => Ok(AgentKind::Ppo),
            _ => Err(AgentError::UnknownAgent(s.to_string())),
        }
    }
}

/// Build an agent with default hyper-parameters and a seeded RNG.
pub fn create_agent(kind: AgentKind, seed: u64) -> Box<dyn TrainablePolicy> {
    match kind {
        AgentKind::Dqn => Box::new(DqnAgent::new(DqnConfig::default(), seed)),
        AgentKind::Ppo => Box::new(PpoAgent::new(PpoConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_bytes_roundtrip() {
        let blob = ParamBlob(vec![1.5, -0.25, 1e-9]);
        let bytes = blob.to_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(ParamBlob::from_bytes(&bytes).unwrap(), blob);
    }

    #[test]
    fn blob_rejects_ragged_bytes() {
        assert_eq!(
            ParamBlob::from_bytes(&[0u8; 12]),
            Err(AgentError::MalformedBytes(12))
        );
    }

    #[test]
    fn expect_len_checks_length_and_finiteness() {
        let blob = ParamBlob(vec![1.0, f64::NAN]);
        assert_eq!(
            blob.expect_len(3).unwrap_err(),
            AgentError::BlobLength {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(blob.expect_len(2).unwrap_err(), AgentError::NonFinite(1));
    }

    #[test]
    fn agent_kind_parses() {
        assert_eq!("DQN".parse::<AgentKind>().unwrap(), AgentKind::Dqn);
        assert_eq!("ppo".parse::<AgentKind>().unwrap(), AgentKind::Ppo);
        assert!("a2c".parse::<AgentKind>().is_err());
    }

    #[test]
    fn create_agent_names() {
        assert_eq!(create_agent(AgentKind::Dqn, 1).name(), "dqn");
        assert_eq!(create_agent(AgentKind::Ppo, 1).name(), "ppo");
    }
}
