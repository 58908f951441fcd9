//! Bollinger Bands: SMA(period) ± multiplier × population stddev.
//! Defined from index `period - 1`.

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let n = closes.len();
    let mut series = BollingerSeries {
        upper: vec![f64::NAN; n],
        middle: vec![f64::NAN; n],
        lower: vec![f64::NAN; n],
    };

    if period == 0 || n < period {
        return series;
    }

    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let stddev = variance.sqrt();

        series.middle[i] = mean;
        series.upper[i] = mean + multiplier * stddev;
        series.lower[i] = mean - multiplier * stddev;
    }

    series
}
