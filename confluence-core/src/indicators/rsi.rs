//! RSI — Relative Strength Index (Wilder).
//!
//! RSI = 100 - 100 / (1 + RS), RS = smoothed gains / smoothed losses.
//! Gains/losses come from close-to-close deltas; smoothing is Wilder
//! (alpha = 1/period). Lookback: period.

use crate::domain::Bar;
use crate::indicators::atr::wilder_smooth;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self::named(format!("rsi_{period}"), period)
    }

    pub fn named(name: impl Into<String>, period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: name.into(),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < 2 {
            return result;
        }

        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let prev = bars[i - 1].close;
            let cur = bars[i].close;
            if prev.is_nan() || cur.is_nan() {
                continue;
            }
            let delta = cur - prev;
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }

        let avg_gain = wilder_smooth(&gains, self.period);
        let avg_loss = wilder_smooth(&losses, self.period);

        for i in 0..n {
            if avg_gain[i].is_nan() || avg_loss[i].is_nan() {
                continue;
            }
            result[i] = if avg_loss[i] == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + avg_gain[i] / avg_loss[i])
            };
        }

        result
    }
}
