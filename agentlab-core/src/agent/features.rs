//! Fixed state feature vector shared by the linear Q-function and critic.

use crate::domain::MarketState;

pub const N_FEATURES: usize = 5;

pub type Features = [f64; N_FEATURES];

/// `[bias, rsi, macd, band position, momentum]`, each scaled to roughly [-2, 2].
///
/// Undefined inputs (NaN indicators, single-price windows, zero-width bands)
/// contribute 0.
pub fn state_features(state: &MarketState) -> Features {
    let price = state.last_price().unwrap_or(0.0);
    let ind = &state.indicators;

    let rsi = ((ind.rsi - 50.0) / 50.0).clamp(-1.0, 1.0);

    let macd = if price > 0.0 {
        (ind.macd / price * 100.0).tanh()
    } else {
        0.0
    };

    let half_width = ind.bbands.width() / 2.0;
    let band_position = if half_width > 0.0 {
        ((price - ind.bbands.middle) / half_width).clamp(-2.0, 2.0)
    } else {
        0.0
    };

    let momentum = match state.previous_price() {
        Some(prev) if prev > 0.0 => ((price / prev - 1.0) * 100.0).tanh(),
        _ => 0.0,
    };

    [1.0, rsi, macd, band_position, momentum].map(finite_or_zero)
}

pub fn dot(weights: &Features, features: &Features) -> f64 {
    weights.iter().zip(features).map(|(w, f)| w * f).sum()
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::make_state;

    #[test]
    fn neutral_state_is_mostly_zero() {
        let state = make_state(&[100.0, 100.0], 50.0, 0.0);
        let f = state_features(&state);
        assert_eq!(f, [1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn rsi_is_clamped() {
        let state = make_state(&[100.0], 130.0, 0.0);
        assert_eq!(state_features(&state)[1], 1.0);
    }

    #[test]
    fn nan_indicators_become_zero() {
        let state = make_state(&[100.0], f64::NAN, f64::NAN);
        let f = state_features(&state);
        assert_eq!(f[1], 0.0);
        assert_eq!(f[2], 0.0);
    }

    #[test]
    fn dot_product() {
        assert_eq!(
            dot(&[1.0, 2.0, 0.0, 0.0, 0.0], &[3.0, 4.0, 9.0, 9.0, 9.0]),
            11.0
        );
    }
}
