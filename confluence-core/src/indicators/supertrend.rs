//! SuperTrend — ATR-based directional indicator.
//!
//! Inherently sequential/stateful: direction flips between support and
//! resistance based on close vs band comparisons.
//!
//! Two outputs are exposed as separate named instances (the same pattern
//! multi-series indicators use elsewhere in this module tree):
//! - `Band`: the active band value, lower band (support) when trending up,
//!   upper band (resistance) when trending down.
//! - `Direction`: +1.0 while trending up, -1.0 while trending down.
//!
//! Lookback: atr_period (same as ATR lookback since it depends on ATR).

use crate::domain::Bar;
use crate::indicators::atr::{true_range, wilder_smooth};
use crate::indicators::Indicator;

/// Which series a `Supertrend` instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupertrendOutput {
    Band,
    Direction,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    output: SupertrendOutput,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64, output: SupertrendOutput) -> Self {
        let suffix = match output {
            SupertrendOutput::Band => "",
            SupertrendOutput::Direction => "_dir",
        };
        Self::named(
            format!("supertrend_{period}_{multiplier}{suffix}"),
            period,
            multiplier,
            output,
        )
    }

    pub fn named(
        name: impl Into<String>,
        period: usize,
        multiplier: f64,
        output: SupertrendOutput,
    ) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        Self {
            period,
            multiplier,
            output,
            name: name.into(),
        }
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        let tr = true_range(bars);
        let atr = wilder_smooth(&tr, self.period);

        let start = match atr.iter().position(|v| !v.is_nan()) {
            Some(idx) => idx,
            None => return result,
        };

        if start >= n {
            return result;
        }

        let hl2 = (bars[start].high + bars[start].low) / 2.0;
        let mut upper_band = hl2 + self.multiplier * atr[start];
        let mut lower_band = hl2 - self.multiplier * atr[start];
        // Start trending up (support)
        let mut trending_up = true;
        result[start] = self.emit(trending_up, lower_band, upper_band);

        for i in (start + 1)..n {
            if atr[i].is_nan()
                || bars[i].close.is_nan()
                || bars[i].high.is_nan()
                || bars[i].low.is_nan()
            {
                result[i] = f64::NAN;
                continue;
            }

            let hl2 = (bars[i].high + bars[i].low) / 2.0;
            let basic_upper = hl2 + self.multiplier * atr[i];
            let basic_lower = hl2 - self.multiplier * atr[i];

            // Upper band: can only decrease (tighten resistance)
            let prev_close = bars[i - 1].close;
            let new_upper = if !prev_close.is_nan() && prev_close <= upper_band {
                basic_upper.min(upper_band)
            } else {
                basic_upper
            };

            // Lower band: can only increase (tighten support)
            let new_lower = if !prev_close.is_nan() && prev_close >= lower_band {
                basic_lower.max(lower_band)
            } else {
                basic_lower
            };

            upper_band = new_upper;
            lower_band = new_lower;

            // Direction flip
            if trending_up && bars[i].close < lower_band {
                trending_up = false;
            } else if !trending_up && bars[i].close > upper_band {
                trending_up = true;
            }

            result[i] = self.emit(trending_up, lower_band, upper_band);
        }

        result
    }
}

impl Supertrend {
    fn emit(&self, trending_up: bool, lower_band: f64, upper_band: f64) -> f64 {
        match self.output {
            SupertrendOutput::Band => {
                if trending_up {
                    lower_band
                } else {
                    upper_band
                }
            }
            SupertrendOutput::Direction => {
                if trending_up {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                symbol: "TEST".to_string(),
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn uptrend_bars() -> Vec<Bar> {
        let mut data = Vec::new();
        for i in 0..15 {
            let base = 100.0 + i as f64 * 2.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 1.0));
        }
        make_ohlc_bars(&data)
    }

    #[test]
    fn supertrend_uptrend_band_below_price() {
        let bars = uptrend_bars();
        let st = Supertrend::new(3, 2.0, SupertrendOutput::Band);
        let result = st.compute(&bars);

        for i in 5..15 {
            if !result[i].is_nan() {
                assert!(
                    result[i] < bars[i].close,
                    "supertrend ({}) should be below close ({}) at bar {i} in uptrend",
                    result[i],
                    bars[i].close
                );
            }
        }
    }

    #[test]
    fn supertrend_uptrend_direction_positive() {
        let bars = uptrend_bars();
        let st = Supertrend::new(3, 2.0, SupertrendOutput::Direction);
        let result = st.compute(&bars);

        for i in 5..15 {
            if !result[i].is_nan() {
                assert_eq!(result[i], 1.0, "direction should be +1 in uptrend at bar {i}");
            }
        }
    }

    #[test]
    fn supertrend_downtrend_flips_direction() {
        let mut data = Vec::new();
        for i in 0..15 {
            let base = 200.0 - i as f64 * 3.0;
            data.push((base + 1.0, base + 3.0, base - 3.0, base - 1.0));
        }
        let bars = make_ohlc_bars(&data);
        let st = Supertrend::new(3, 2.0, SupertrendOutput::Direction);
        let result = st.compute(&bars);

        let flipped = (5..15).any(|i| !result[i].is_nan() && result[i] == -1.0);
        assert!(flipped, "direction should flip to -1 at some point in a downtrend");
    }

    #[test]
    fn supertrend_lookback() {
        assert_eq!(Supertrend::new(14, 3.0, SupertrendOutput::Band).lookback(), 14);
    }

    #[test]
    fn supertrend_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let st = Supertrend::new(3, 2.0, SupertrendOutput::Band);
        let result = st.compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
