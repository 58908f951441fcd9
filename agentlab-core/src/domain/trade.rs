//! Trade: an executed buy or sell, appended to the run's audit trail.

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Immutable record of one executed order.
///
/// `action` is the decision as the policy issued it (before clamping);
/// `price` is the execution price and `equity_after` the account equity
/// marked at that price once the order is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub action: Action,
    pub price: f64,
    pub equity_after: f64,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_uses_camel_case_fields() {
        let trade = Trade {
            action: Action::buy(),
            price: 100.0,
            equity_after: 10_000.0,
            timestamp: 1_704_153_600_000,
        };
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["equityAfter"], 10_000.0);
        assert_eq!(json["action"]["kind"], "buy");
        assert!(json.get("equity_after").is_none());
    }
}
