//! Risk and performance metrics: pure functions over return series and tallies.

/// Trading days per year used to annualize daily Sharpe.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations within this fraction of |mean| are treated as zero variance.
const ZERO_VARIANCE_REL: f64 = 1e-12;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by N).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Annualized Sharpe ratio of daily returns, risk-free rate 0.
///
/// Sharpe = mean / population_std * sqrt(252).
/// Returns 0.0 with fewer than 2 samples or zero variance.
pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let m = mean(daily_returns);
    let std = population_std_dev(daily_returns);
    if std <= ZERO_VARIANCE_REL * m.abs().max(f64::MIN_POSITIVE) {
        return 0.0;
    }
    m / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Percentage change from `initial` to `final_value`.
pub fn return_pct(final_value: f64, initial: f64) -> f64 {
    (final_value - initial) / initial * 100.0
}

/// Win/loss count over classified sell trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinTally {
    pub wins: usize,
    pub losses: usize,
}

impl WinTally {
    pub fn record(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.wins + self.losses
    }

    /// `wins / (wins + losses) * 100`, or 0.0 with nothing classified.
    pub fn win_rate_pct(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std_divides_by_n() {
        // values 1, 3 → mean 2, var = (1 + 1) / 2 = 1
        assert_eq!(population_std_dev(&[1.0, 3.0]), 1.0);
    }

    #[test]
    fn sharpe_needs_two_samples() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
        assert_eq!(sharpe_ratio(&[0.05]), 0.0);
    }

    #[test]
    fn sharpe_constant_returns_is_zero() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01, 0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.01, population std 0.01 → sqrt(252)
        let s = sharpe_ratio(&[0.0, 0.02]);
        assert!((s - 252.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn sharpe_tiny_returns_not_degenerate() {
        // mean 2e-13, population std 1e-13 → 2 * sqrt(252)
        let s = sharpe_ratio(&[1e-13, 3e-13]);
        assert!((s - 2.0 * 252.0_f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn sharpe_constant_returns_with_rounding_is_zero() {
        let r = 0.1 + 0.2 - 0.3 + 0.01;
        assert_eq!(sharpe_ratio(&[r, r, r, r, r, r, r]), 0.0);
    }

    #[test]
    fn sharpe_negative_for_losses() {
        assert!(sharpe_ratio(&[-0.02, -0.01, -0.03]) < 0.0);
    }

    #[test]
    fn return_pct_calculation() {
        assert_eq!(return_pct(11_000.0, 10_000.0), 10.0);
        assert_eq!(return_pct(9_500.0, 10_000.0), -5.0);
    }

    #[test]
    fn win_rate_tally() {
        let mut tally = WinTally::default();
        assert_eq!(tally.win_rate_pct(), 0.0);
        tally.record(true);
        tally.record(false);
        tally.record(true);
        tally.record(true);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.win_rate_pct(), 75.0);
    }
}
