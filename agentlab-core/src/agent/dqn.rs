//! Epsilon-greedy DQN stand-in with a linear Q-function.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::features::{dot, state_features, Features, N_FEATURES};
use super::replay::{ReplayBuffer, DEFAULT_REPLAY_CAPACITY};
use super::{AgentError, ParamBlob, TrainablePolicy};
use crate::domain::{Action, ActionKind, Experience, MarketState};
use crate::policy::{Policy, PolicyError, ThresholdPolicy};

const N_ACTIONS: usize = 3;

/// Blob layout: `[epsilon, updates, q_weights (action-major)...]`.
const BLOB_LEN: usize = 2 + N_ACTIONS * N_FEATURES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub discount: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    pub batch_size: usize,
    pub buffer_capacity: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            discount: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 64,
            buffer_capacity: DEFAULT_REPLAY_CAPACITY,
        }
    }
}

/// Explores with probability `epsilon`; otherwise exploits.
///
/// Exploitation uses the RSI threshold rule until the Q-function has received
/// at least one update, then `argmax_a Q(s, a)`.
pub struct DqnAgent {
    config: DqnConfig,
    q_weights: [Features; N_ACTIONS],
    buffer: ReplayBuffer,
    epsilon: f64,
    updates: u64,
    rng: StdRng,
    fallback: ThresholdPolicy,
    name: String,
}

impl DqnAgent {
    pub fn new(config: DqnConfig, seed: u64) -> Self {
        Self {
            q_weights: [[0.0; N_FEATURES]; N_ACTIONS],
            buffer: ReplayBuffer::new(config.buffer_capacity),
            epsilon: config.epsilon_start,
            updates: 0,
            rng: StdRng::seed_from_u64(seed),
            fallback: ThresholdPolicy::default(),
            name: "dqn".to_string(),
            config,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Q-values indexed by [`ActionKind::index`].
    pub fn q_values(&self, state: &MarketState) -> [f64; N_ACTIONS] {
        let f = state_features(state);
        self.q_weights.map(|w| dot(&w, &f))
    }

    fn greedy(&self, state: &MarketState) -> ActionKind {
        let q = self.q_values(state);
        // Ties resolve to Hold.
        let mut best = ActionKind::Hold;
        for kind in [ActionKind::Buy, ActionKind::Sell] {
            if q[kind.index()] > q[best.index()] {
                best = kind;
            }
        }
        best
    }
}

/// One TD(0) gradient step on `weights`; returns the squared TD error.
fn td_update(
    weights: &mut [Features; N_ACTIONS],
    exp: &Experience,
    learning_rate: f64,
    discount: f64,
) -> f64 {
    let f = state_features(&exp.state);
    let a = exp.action.kind.index();

    let bootstrap = if exp.done {
        0.0
    } else {
        let next = state_features(&exp.next_state);
        weights
            .iter()
            .map(|w| dot(w, &next))
            .fold(f64::NEG_INFINITY, f64::max)
    };
    let target = exp.reward.value + discount * bootstrap;
    let td = target - dot(&weights[a], &f);

    for (w, x) in weights[a].iter_mut().zip(f.iter()) {
        *w += learning_rate * td * x;
    }
    td * td
}

impl Policy for DqnAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError> {
        if self.rng.gen::<f64>() < self.epsilon {
            let kind = ActionKind::ALL[self.rng.gen_range(0..N_ACTIONS)];
            return Ok(Action { kind, amount: None });
        }
        if self.updates == 0 {
            return Ok(self.fallback.rule(state));
        }
        Ok(Action {
            kind: self.greedy(state),
            amount: None,
        })
    }
}

impl TrainablePolicy for DqnAgent {
    fn train(&mut self, experiences: &[Experience]) -> Result<f64, AgentError> {
        self.buffer.extend(experiences.iter().cloned());
        if !self.buffer.can_sample(self.config.batch_size) {
            return Ok(0.0);
        }

        let batch = self.buffer.sample(&mut self.rng, self.config.batch_size);
        let mut total = 0.0;
        for exp in &batch {
            total += td_update(
                &mut self.q_weights,
                exp,
                self.config.learning_rate,
                self.config.discount,
            );
        }
        let loss = total / batch.len() as f64;

        self.updates += 1;
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
        Ok(loss)
    }

    fn save(&self) -> ParamBlob {
        let mut values = Vec::with_capacity(BLOB_LEN);
        values.push(self.epsilon);
        values.push(self.updates as f64);
        for w in &self.q_weights {
            values.extend_from_slice(w);
        }
        ParamBlob(values)
    }

    fn load(&mut self, blob: &ParamBlob) -> Result<(), AgentError> {
        let values = blob.expect_len(BLOB_LEN)?;
        if !(0.0..=1.0).contains(&values[0]) {
            return Err(AgentError::InvalidEpsilon(values[0]));
        }
        self.epsilon = values[0];
        self.updates = values[1].max(0.0) as u64;
        for (a, chunk) in values[2..].chunks_exact(N_FEATURES).enumerate() {
            self.q_weights[a].copy_from_slice(chunk);
        }
        Ok(())
    }
}
