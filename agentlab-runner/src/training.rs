//! Training loop for trainable policies.
//!
//! Each episode rolls the agent over a state sequence with the engine's
//! accounting, then feeds the collected experiences to `train`. Episodes
//! run either on the caller's states or on fresh synthetic random walks
//! seeded per episode from the run's master seed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use agentlab_core::agent::{AgentError, TrainablePolicy};
use agentlab_core::domain::MarketState;
use agentlab_core::engine::{collect_experiences, BacktestError};
use agentlab_core::feed::{build_states, FeedConfig, FeedError};
use agentlab_core::rng::RngHierarchy;
use agentlab_core::synthetic::random_walk_bars;

const SYNTHETIC_START_MS: i64 = 1_577_836_800_000; // 2020-01-01T00:00:00Z
const DAY_MS: i64 = 86_400_000;
const SYNTHETIC_START_PRICE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// When set, every episode trains on a fresh synthetic random walk of
    /// this many bars instead of the run's own states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_bars: Option<usize>,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training needs at least one episode")]
    ZeroEpisodes,
    #[error("episode {episode}: rollout failed: {source}")]
    Rollout {
        episode: usize,
        #[source]
        source: BacktestError,
    },
    #[error("episode {episode}: update failed: {source}")]
    Update {
        episode: usize,
        #[source]
        source: AgentError,
    },
    #[error("episode {episode}: synthetic feed failed: {source}")]
    Feed {
        episode: usize,
        #[source]
        source: FeedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub episodes: usize,
    /// Loss returned by `train` for each episode, in order.
    pub losses: Vec<f64>,
    pub experiences: usize,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Train `agent` for `config.episodes` episodes.
pub fn train_agent(
    agent: &mut dyn TrainablePolicy,
    config: &TrainingConfig,
    states: &[MarketState],
    feed: &FeedConfig,
    initial_balance: f64,
    seed: u64,
) -> Result<TrainingReport, TrainError> {
    if config.episodes == 0 {
        return Err(TrainError::ZeroEpisodes);
    }

    let rngs = RngHierarchy::new(seed);
    let mut losses = Vec::with_capacity(config.episodes);
    let mut experiences = 0;

    for episode in 0..config.episodes {
        let synthetic;
        let episode_states = match config.synthetic_bars {
            Some(bars) => {
                synthetic = synthetic_episode(&rngs, episode, bars, feed)
                    .map_err(|source| TrainError::Feed { episode, source })?;
                synthetic.as_slice()
            }
            None => states,
        };

        let batch = collect_experiences(&mut *agent, episode_states, initial_balance)
            .map_err(|source| TrainError::Rollout { episode, source })?;
        let loss = agent
            .train(&batch)
            .map_err(|source| TrainError::Update { episode, source })?;

        info!(
            agent = agent.name(),
            episode,
            experiences = batch.len(),
            loss,
            "training episode complete"
        );
        experiences += batch.len();
        losses.push(loss);
    }

    Ok(TrainingReport {
        episodes: config.episodes,
        losses,
        experiences,
    })
}

fn synthetic_episode(
    rngs: &RngHierarchy,
    episode: usize,
    bars: usize,
    feed: &FeedConfig,
) -> Result<Vec<MarketState>, FeedError> {
    let walk = random_walk_bars(
        rngs.sub_seed("episode", episode as u64),
        bars,
        SYNTHETIC_START_MS,
        DAY_MS,
        SYNTHETIC_START_PRICE,
    );
    build_states(&walk, feed)
}
