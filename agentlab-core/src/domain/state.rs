//! MarketState: one immutable observation fed to a policy.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Bollinger Bands snapshot. Expected ordering: `upper >= middle >= lower`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    pub fn is_ordered(&self) -> bool {
        self.upper >= self.middle && self.middle >= self.lower
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Derived signals attached to a state by the indicator pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Relative Strength Index, 0–100.
    pub rsi: f64,
    /// MACD line (signed).
    pub macd: f64,
    pub bbands: BollingerBands,
}

/// One observation at a point in time.
///
/// `prices` is most-recent-last. `timestamp` is milliseconds since the Unix
/// epoch and must be non-decreasing across a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub prices: Vec<f64>,
    pub indicators: Indicators,
    pub volume: f64,
    pub timestamp: i64,
}

impl MarketState {
    /// Execution price for this bar: the most recent price.
    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// The price one step before the most recent, if the window has one.
    pub fn previous_price(&self) -> Option<f64> {
        let n = self.prices.len();
        if n < 2 {
            return None;
        }
        Some(self.prices[n - 2])
    }

    /// UTC calendar day of `timestamp`, `None` if out of chrono's range.
    pub fn day(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.timestamp).map(|dt| dt.date_naive())
    }
}
