//! MACD — Moving Average Convergence Divergence.
//!
//! MACD line = EMA(fast) - EMA(slow); signal = EMA(macd, signal_period);
//! histogram = macd - signal. The three series are exposed as separate named
//! instances selected by `MacdLine` (same pattern as the SuperTrend outputs).
//!
//! Lookback: slow + signal - 2.

use crate::domain::Bar;
use crate::indicators::ema::ema_of_series;
use crate::indicators::Indicator;

/// Which series a `Macd` instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        let suffix = match line {
            MacdLine::Line => "",
            MacdLine::Signal => "_signal",
            MacdLine::Histogram => "_hist",
        };
        Self::named(
            format!("macd_{fast}_{slow}_{signal}{suffix}"),
            fast,
            slow,
            signal,
            line,
        )
    }

    pub fn named(
        name: impl Into<String>,
        fast: usize,
        slow: usize,
        signal: usize,
        line: MacdLine,
    ) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be < slow period");
        Self {
            fast,
            slow,
            signal,
            line,
            name: name.into(),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let ema_fast = ema_of_series(&closes, self.fast);
        let ema_slow = ema_of_series(&closes, self.slow);

        let mut macd = vec![f64::NAN; n];
        for i in 0..n {
            if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
                macd[i] = ema_fast[i] - ema_slow[i];
            }
        }

        if self.line == MacdLine::Line {
            return macd;
        }

        // Signal EMA is seeded from the first valid stretch of the MACD line.
        let first_valid = macd.iter().position(|v| !v.is_nan()).unwrap_or(n);
        let mut signal = vec![f64::NAN; n];
        if first_valid < n {
            let tail = ema_of_series(&macd[first_valid..], self.signal);
            for (i, v) in tail.into_iter().enumerate() {
                signal[first_valid + i] = v;
            }
        }

        match self.line {
            MacdLine::Line => unreachable!(),
            MacdLine::Signal => signal,
            MacdLine::Histogram => {
                let mut hist = vec![f64::NAN; n];
                for i in 0..n {
                    if !macd[i].is_nan() && !signal[i].is_nan() {
                        hist[i] = macd[i] - signal[i];
                    }
                }
                hist
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn trend_closes() -> Vec<f64> {
        (0..60).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let bars = make_bars(&trend_closes());
        let macd = Macd::new(12, 26, 9, MacdLine::Line);
        let result = macd.compute(&bars);
        let last = result.last().unwrap();
        assert!(*last > 0.0, "MACD should be positive in steady uptrend, got {last}");
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let bars = make_bars(&trend_closes());
        let line = Macd::new(12, 26, 9, MacdLine::Line).compute(&bars);
        let signal = Macd::new(12, 26, 9, MacdLine::Signal).compute(&bars);
        let hist = Macd::new(12, 26, 9, MacdLine::Histogram).compute(&bars);

        for i in 0..bars.len() {
            if !hist[i].is_nan() {
                assert!((hist[i] - (line[i] - signal[i])).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn macd_warmup_is_nan() {
        let bars = make_bars(&trend_closes());
        let macd = Macd::new(12, 26, 9, MacdLine::Signal);
        let result = macd.compute(&bars);
        for &v in result.iter().take(macd.lookback()) {
            assert!(v.is_nan());
        }
    }

    #[test]
    fn macd_lookback() {
        assert_eq!(Macd::new(12, 26, 9, MacdLine::Signal).lookback(), 33);
    }

    #[test]
    #[should_panic(expected = "fast period must be < slow")]
    fn macd_rejects_inverted_periods() {
        let _ = Macd::new(26, 12, 9, MacdLine::Line);
    }
}
