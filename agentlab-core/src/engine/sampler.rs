//! Daily equity sampling: return series, running peak, max drawdown.

/// Samples equity once per calendar-day change.
///
/// The first sample is measured against the initial balance, which is also
/// the starting peak.
#[derive(Debug, Clone)]
pub struct DailySampler {
    last_equity: f64,
    peak: f64,
    max_drawdown: f64,
    returns: Vec<f64>,
}

impl DailySampler {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            last_equity: initial_equity,
            peak: initial_equity,
            max_drawdown: 0.0,
            returns: Vec::new(),
        }
    }

    /// Record equity at a day boundary.
    pub fn sample(&mut self, equity: f64) {
        let daily_return = if self.last_equity > 0.0 {
            (equity - self.last_equity) / self.last_equity
        } else {
            0.0
        };
        self.returns.push(daily_return);
        self.last_equity = equity;

        if equity > self.peak {
            self.peak = equity;
        } else if self.peak > 0.0 {
            let drawdown = (self.peak - equity) / self.peak;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Largest peak-to-trough decline as a fraction of the peak.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }
}
