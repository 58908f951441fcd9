//! Synthetic market data for tests, demos and agent training.
//!
//! Everything here is driven by a caller-supplied seed; nothing reads the
//! wall clock or OS entropy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{BollingerBands, Indicators, MarketState};
use crate::feed::PriceBar;

/// Number of prices carried by a mock state.
pub const MOCK_WINDOW: usize = 10;

/// One random observation: a base price in `[50_000, 55_000)`, ten prices
/// drifting up to ±1% from it, uniform RSI in `[0, 100)`, MACD in
/// `[-100, 100)` and bands at ±5% of the base.
pub fn mock_state<R: Rng + ?Sized>(rng: &mut R, timestamp: i64) -> MarketState {
    let base = 50_000.0 + rng.gen_range(0.0..5_000.0);
    let prices = (0..MOCK_WINDOW)
        .map(|i| {
            let jitter: f64 = rng.gen_range(-0.5..0.5);
            base * (1.0 + jitter * 0.02 * i as f64 / MOCK_WINDOW as f64)
        })
        .collect();

    MarketState {
        prices,
        indicators: Indicators {
            rsi: rng.gen_range(0.0..100.0),
            macd: rng.gen_range(-100.0..100.0),
            bbands: BollingerBands {
                upper: base * 1.05,
                middle: base,
                lower: base * 0.95,
            },
        },
        volume: rng.gen_range(0.0..1_000.0),
        timestamp,
    }
}

/// Geometric random walk: `n` bars starting at `start_price`, daily moves
/// uniform in ±3%, timestamps `start_ms + i * step_ms`.
pub fn random_walk_bars(
    seed: u64,
    n: usize,
    start_ms: i64,
    step_ms: i64,
    start_price: f64,
) -> Vec<PriceBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price;
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        if i > 0 {
            let ret: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + ret;
        }
        bars.push(PriceBar {
            timestamp: start_ms + i as i64 * step_ms,
            close: price,
            volume: rng.gen_range(500_000.0..5_000_000.0),
        });
    }

    bars
}
