//! Action: a policy decision for one state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::policy::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Sell,
    Hold,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Buy, ActionKind::Sell, ActionKind::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Buy => "buy",
            ActionKind::Sell => "sell",
            ActionKind::Hold => "hold",
        }
    }

    /// Position of this kind in [`ActionKind::ALL`]; used to index Q-values.
    pub fn index(&self) -> usize {
        match self {
            ActionKind::Buy => 0,
            ActionKind::Sell => 1,
            ActionKind::Hold => 2,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(ActionKind::Buy),
            "sell" => Ok(ActionKind::Sell),
            "hold" => Ok(ActionKind::Hold),
            _ => Err(PolicyError::UnknownKind(s.to_string())),
        }
    }
}

/// A trading decision. `amount` is a notional (cash) quantity; when absent
/// the engine applies its default sizing rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Action {
    pub fn buy() -> Self {
        Self {
            kind: ActionKind::Buy,
            amount: None,
        }
    }

    pub fn sell() -> Self {
        Self {
            kind: ActionKind::Sell,
            amount: None,
        }
    }

    pub fn hold() -> Self {
        Self {
            kind: ActionKind::Hold,
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Reject amounts the engine cannot account for.
    pub fn validate(&self) -> Result<(), PolicyError> {
        match self.amount {
            Some(a) if !a.is_finite() => Err(PolicyError::NonFiniteAmount),
            Some(a) if a < 0.0 => Err(PolicyError::NegativeAmount(a)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("BUY".parse::<ActionKind>().unwrap(), ActionKind::Buy);
        assert_eq!(" sell ".parse::<ActionKind>().unwrap(), ActionKind::Sell);
        assert!(matches!(
            "short".parse::<ActionKind>(),
            Err(PolicyError::UnknownKind(k)) if k == "short"
        ));
    }

    #[test]
    fn validate_rejects_negative_and_nan() {
        assert!(Action::buy().validate().is_ok());
        assert!(Action::sell().with_amount(0.0).validate().is_ok());
        assert!(matches!(
            Action::buy().with_amount(-1.0).validate(),
            Err(PolicyError::NegativeAmount(_))
        ));
        assert!(matches!(
            Action::buy().with_amount(f64::NAN).validate(),
            Err(PolicyError::NonFiniteAmount)
        ));
    }

    #[test]
    fn amount_omitted_from_json_when_absent() {
        let json = serde_json::to_string(&Action::hold()).unwrap();
        assert_eq!(json, r#"{"kind":"hold"}"#);
        let json = serde_json::to_string(&Action::buy().with_amount(250.0)).unwrap();
        assert_eq!(json, r#"{"kind":"buy","amount":250.0}"#);
    }

    #[test]
    fn unknown_kind_fails_to_deserialize() {
        let parsed: Result<Action, _> = serde_json::from_str(r#"{"kind":"short"}"#);
        assert!(parsed.is_err());
    }
}
