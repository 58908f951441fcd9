//! Scripted policy: replays a pre-recorded sequence of raw actions.
//!
//! Actions are kept in their external form (kind as a string) and parsed on
//! use, so a malformed entry surfaces as a `PolicyError` on the bar that
//! consumes it.

use serde::{Deserialize, Serialize};

use super::{Policy, PolicyError};
use crate::domain::{Action, ActionKind, MarketState};

/// An action as supplied by an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedAction {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl ScriptedAction {
    pub fn new(kind: &str, amount: Option<f64>) -> Self {
        Self {
            kind: kind.to_string(),
            amount,
        }
    }

    fn to_action(&self) -> Result<Action, PolicyError> {
        let kind: ActionKind = self.kind.parse()?;
        let action = Action {
            kind,
            amount: self.amount,
        };
        action.validate()?;
        Ok(action)
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    script: Vec<ScriptedAction>,
    cursor: usize,
    name: String,
}

impl ScriptedPolicy {
    pub fn new(script: Vec<ScriptedAction>) -> Self {
        Self {
            script,
            cursor: 0,
            name: "scripted".to_string(),
        }
    }

    /// Build from typed actions.
    pub fn from_actions(actions: &[Action]) -> Self {
        Self::new(
            actions
                .iter()
                .map(|a| ScriptedAction::new(a.kind.as_str(), a.amount))
                .collect(),
        )
    }

    /// Parse a JSON array of `{ "kind": ..., "amount": ... }` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn remaining(&self) -> usize {
        self.script.len() - self.cursor
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, _state: &MarketState) -> Result<Action, PolicyError> {
        let entry = self
            .script
            .get(self.cursor)
            .ok_or(PolicyError::ScriptExhausted(self.script.len()))?;
        self.cursor += 1;
        entry.to_action()
    }
}
