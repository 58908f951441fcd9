//! PPO stand-in: momentum-rule actor with a learned linear critic.

use serde::{Deserialize, Serialize};

use super::features::{dot, state_features, Features, N_FEATURES};
use super::{AgentError, ParamBlob, TrainablePolicy};
use crate::domain::{Action, Experience, MarketState};
use crate::policy::{MomentumPolicy, Policy, PolicyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpoConfig {
    pub learning_rate: f64,
    pub discount: f64,
    /// Bound on the TD error used in each critic update.
    pub clip_epsilon: f64,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.0003,
            discount: 0.99,
            clip_epsilon: 0.2,
        }
    }
}

/// Acts with the MACD momentum rule. Training fits the critic `V(s)` to
/// one-step returns over the supplied (on-policy) experiences.
pub struct PpoAgent {
    config: PpoConfig,
    critic: Features,
    actor: MomentumPolicy,
    name: String,
}

impl PpoAgent {
    pub fn new(config: PpoConfig) -> Self {
        Self {
            config,
            critic: [0.0; N_FEATURES],
            actor: MomentumPolicy::new(),
            name: "ppo".to_string(),
        }
    }

    /// Critic estimate of the state value.
    pub fn value(&self, state: &MarketState) -> f64 {
        dot(&self.critic, &state_features(state))
    }
}

impl Policy for PpoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &MarketState) -> Result<Action, PolicyError> {
        Ok(self.actor.rule(state))
    }
}

impl TrainablePolicy for PpoAgent {
    fn train(&mut self, experiences: &[Experience]) -> Result<f64, AgentError> {
        if experiences.is_empty() {
            return Ok(0.0);
        }

        let clip = self.config.clip_epsilon;
        let mut total = 0.0;
        for exp in experiences {
            let f = state_features(&exp.state);
            let bootstrap = if exp.done { 0.0 } else { self.value(&exp.next_state) };
            let target = exp.reward.value + self.config.discount * bootstrap;
            let td = target - dot(&self.critic, &f);
            total += td * td;

            let step = self.config.learning_rate * td.clamp(-clip, clip);
            for (w, x) in self.critic.iter_mut().zip(f.iter()) {
                *w += step * x;
            }
        }
        Ok(total / experiences.len() as f64)
    }

    fn save(&self) -> ParamBlob {
        ParamBlob(self.critic.to_vec())
    }

    fn load(&mut self, blob: &ParamBlob) -> Result<(), AgentError> {
        let values = blob.expect_len(N_FEATURES)?;
        self.critic.copy_from_slice(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionKind, Reward};
    use crate::policy::make_state;

    fn rising_experience(value: f64) -> Experience {
        let state = make_state(&[100.0, 101.0], 60.0, 1.0);
        Experience {
            state: state.clone(),
            action: Action::buy(),
            reward: Reward {
                value,
                pnl: value * 10_000.0,
            },
            next_state: state,
            done: true,
        }
    }

    #[test]
    fn acts_like_momentum_rule() {
        let mut agent = PpoAgent::new(PpoConfig::default());
        let state = make_state(&[100.0, 101.0], 50.0, 2.0);
        assert_eq!(agent.decide(&state).unwrap().kind, ActionKind::Buy);
    }

    #[test]
    fn empty_batch_has_zero_loss() {
        let mut agent = PpoAgent::new(PpoConfig::default());
        assert_eq!(agent.train(&[]).unwrap(), 0.0);
    }

    #[test]
    fn critic_moves_toward_reward() {
        let mut agent = PpoAgent::new(PpoConfig {
            learning_rate: 0.1,
            ..PpoConfig::default()
        });
        let exps = vec![rising_experience(0.05); 20];
        let first = agent.train(&exps).unwrap();
        let second = agent.train(&exps).unwrap();
        assert!(second < first);
        assert!(agent.value(&exps[0].state) > 0.0);
    }

    #[test]
    fn save_load_roundtrip() {
        let mut agent = PpoAgent::new(PpoConfig::default());
        agent.train(&[rising_experience(0.02)]).unwrap();
        let blob = agent.save();
        let mut restored = PpoAgent::new(PpoConfig::default());
        restored.load(&blob).unwrap();
        assert_eq!(restored.save(), blob);
        assert!(restored.load(&ParamBlob(vec![1.0])).is_err());
    }
}
