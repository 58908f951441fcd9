//! Feed builder: turns raw close bars into `MarketState`s.
//!
//! Indicators are computed over the full close series, then each emitted
//! state carries a trailing window of prices plus the indicator values at
//! that bar. Bars before every indicator is defined (and before the window
//! is full) are skipped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{BollingerBands, Indicators, MarketState};
use crate::indicators::{bollinger, macd_line, rsi};

/// One raw observation: close price and volume at a timestamp (ms since epoch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Number of trailing prices carried on each state.
    pub window: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window: 10,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
        }
    }
}

impl FeedConfig {
    /// Index of the first bar at which every indicator and the window are defined.
    pub fn warmup(&self) -> usize {
        let rsi_first = self.rsi_period;
        let macd_first = self.macd_fast.max(self.macd_slow).saturating_sub(1);
        let bb_first = self.bollinger_period.saturating_sub(1);
        let window_first = self.window.saturating_sub(1);
        rsi_first.max(macd_first).max(bb_first).max(window_first)
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        let periods = [
            ("window", self.window),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("bollinger_period", self.bollinger_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(FeedError::ZeroPeriod(name));
            }
        }
        if !self.bollinger_multiplier.is_finite() || self.bollinger_multiplier < 0.0 {
            return Err(FeedError::InvalidMultiplier(self.bollinger_multiplier));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
    #[error("bollinger multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),
    #[error("bar {index}: close must be finite and positive, got {close}")]
    InvalidClose { index: usize, close: f64 },
    #[error("bar {index}: timestamp {timestamp} precedes previous {previous}")]
    UnsortedTimestamps {
        index: usize,
        timestamp: i64,
        previous: i64,
    },
    #[error("need more than {warmup} bars to emit a state, got {available}")]
    NotEnoughBars { warmup: usize, available: usize },
}

/// Build the state sequence for `bars` (ascending by timestamp).
pub fn build_states(bars: &[PriceBar], config: &FeedConfig) -> Result<Vec<MarketState>, FeedError> {
    config.validate()?;

    for (index, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(FeedError::InvalidClose {
                index,
                close: bar.close,
            });
        }
        if index > 0 && bar.timestamp < bars[index - 1].timestamp {
            return Err(FeedError::UnsortedTimestamps {
                index,
                timestamp: bar.timestamp,
                previous: bars[index - 1].timestamp,
            });
        }
    }

    let warmup = config.warmup();
    if bars.len() <= warmup {
        return Err(FeedError::NotEnoughBars {
            warmup,
            available: bars.len(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let rsi_series = rsi(&closes, config.rsi_period);
    let macd_series = macd_line(&closes, config.macd_fast, config.macd_slow);
    let bands = bollinger(&closes, config.bollinger_period, config.bollinger_multiplier);

    if warmup > 0 {
        warn!(
            skipped = warmup,
            emitted = bars.len() - warmup,
            "skipping indicator warmup bars"
        );
    }

    let states = (warmup..bars.len())
        .map(|i| MarketState {
            prices: closes[i + 1 - config.window..=i].to_vec(),
            indicators: Indicators {
                rsi: rsi_series[i],
                macd: macd_series[i],
                bbands: BollingerBands {
                    upper: bands.upper[i],
                    middle: bands.middle[i],
                    lower: bands.lower[i],
                },
            },
            volume: bars[i].volume,
            timestamp: bars[i].timestamp,
        })
        .collect();

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| PriceBar {
                timestamp: 1_704_067_200_000 + i as i64 * DAY_MS,
                close: 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1,
                volume: 1_000.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn default_warmup_is_slow_macd() {
        assert_eq!(FeedConfig::default().warmup(), 25);
    }

    #[test]
    fn skips_warmup_and_defines_every_indicator() {
        let input = bars(40);
        let states = build_states(&input, &FeedConfig::default()).unwrap();
        assert_eq!(states.len(), 15);
        assert_eq!(states[0].timestamp, input[25].timestamp);
        for s in &states {
            assert_eq!(s.prices.len(), 10);
            assert!(s.indicators.rsi.is_finite());
            assert!(s.indicators.macd.is_finite());
            assert!(s.indicators.bbands.is_ordered());
        }
    }

    #[test]
    fn window_ends_at_current_close() {
        let input = bars(30);
        let states = build_states(&input, &FeedConfig::default()).unwrap();
        let last = states.last().unwrap();
        assert_eq!(last.last_price(), Some(input[29].close));
        assert_eq!(last.prices[0], input[20].close);
    }

    #[test]
    fn too_few_bars_rejected() {
        let err = build_states(&bars(25), &FeedConfig::default()).unwrap_err();
        assert_eq!(
            err,
            FeedError::NotEnoughBars {
                warmup: 25,
                available: 25
            }
        );
    }

    #[test]
    fn unsorted_bars_rejected() {
        let mut input = bars(30);
        input.swap(3, 4);
        assert!(matches!(
            build_states(&input, &FeedConfig::default()),
            Err(FeedError::UnsortedTimestamps { index: 4, .. })
        ));
    }

    #[test]
    fn non_positive_close_rejected() {
        let mut input = bars(30);
        input[7].close = 0.0;
        assert!(matches!(
            build_states(&input, &FeedConfig::default()),
            Err(FeedError::InvalidClose { index: 7, .. })
        ));
    }

    #[test]
    fn zero_window_rejected() {
        let config = FeedConfig {
            window: 0,
            ..FeedConfig::default()
        };
        assert_eq!(
            build_states(&bars(30), &config).unwrap_err(),
            FeedError::ZeroPeriod("window")
        );
    }
}
