//! Indicator functions over close-price series.
//!
//! Each function returns a vector aligned with its input: index `i` holds the
//! value computed from `closes[0..=i]`, NaN until the lookback is satisfied.
//! These feed the `indicators` bundle of every `MarketState` built by
//! [`crate::feed`].

pub mod bollinger;
pub mod ema;
pub mod rsi;

pub use bollinger::{bollinger, BollingerSeries};
pub use ema::{ema, macd_line};
pub use rsi::rsi;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
