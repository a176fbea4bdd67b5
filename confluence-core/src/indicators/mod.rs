//! Indicator trait and precomputed indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! are computed once over the full window and queried per bar by the
//! pipeline. The charting-host analog is a set of built-in series the host
//! hands to the script; `IndicatorValues` plays that role here.
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. The first `lookback()` values of every series are `f64::NAN`.

use crate::config::StrategyConfig;
use crate::domain::Bar;
use std::collections::HashMap;

pub mod adx;
pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod supertrend;
pub mod volume;

pub use adx::Adx;
pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;
pub use supertrend::{Supertrend, SupertrendOutput};
pub use volume::VolumeSma;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_21", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator series, queried by bar index.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Like `get`, but treats NaN and missing values uniformly as `None`.
    pub fn get_valid(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.get(name, bar_index).filter(|v| !v.is_nan())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Series names the pipeline expects from `precompute` (or from a host).
pub mod keys {
    pub const EMA_9: &str = "ema_9";
    pub const EMA_21: &str = "ema_21";
    pub const EMA_50: &str = "ema_50";
    pub const EMA_200: &str = "ema_200";
    pub const ATR_14: &str = "atr_14";
    pub const ATR_MEAN: &str = "atr_mean_50";
    pub const ADX_14: &str = "adx_14";
    pub const SUPERTREND: &str = "supertrend";
    pub const SUPERTREND_DIR: &str = "supertrend_dir";
    pub const RSI_14: &str = "rsi_14";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const VOLUME_MEAN: &str = "volume_mean_20";
}

/// Compute the full indicator set the pipeline reads.
///
/// Periods come from the strategy configuration; names follow `keys`.
pub fn precompute(bars: &[Bar], config: &StrategyConfig) -> IndicatorValues {
    let mut values = IndicatorValues::new();

    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Ema::named(keys::EMA_9, 9)),
        Box::new(Ema::named(keys::EMA_21, 21)),
        Box::new(Ema::named(keys::EMA_50, 50)),
        Box::new(Ema::named(keys::EMA_200, 200)),
        Box::new(Atr::named(keys::ATR_14, config.atr_period)),
        Box::new(Adx::named(keys::ADX_14, config.adx_period)),
        Box::new(Supertrend::named(
            keys::SUPERTREND,
            config.supertrend_period,
            config.supertrend_multiplier,
            SupertrendOutput::Band,
        )),
        Box::new(Supertrend::named(
            keys::SUPERTREND_DIR,
            config.supertrend_period,
            config.supertrend_multiplier,
            SupertrendOutput::Direction,
        )),
        Box::new(Rsi::named(keys::RSI_14, 14)),
        Box::new(Macd::named(keys::MACD, 12, 26, 9, MacdLine::Line)),
        Box::new(Macd::named(keys::MACD_SIGNAL, 12, 26, 9, MacdLine::Signal)),
        Box::new(VolumeSma::named(keys::VOLUME_MEAN, config.volume_period)),
    ];

    for ind in &indicators {
        values.insert(ind.name(), ind.compute(bars));
    }

    // Trailing mean of ATR, used by the volatility classifier.
    let atr_series = values
        .get_series(keys::ATR_14)
        .map(|s| s.to_vec())
        .unwrap_or_default();
    values.insert(
        keys::ATR_MEAN,
        sma::sma_of_series(&atr_series, config.atr_mean_period),
    );

    values
}

/// Warmup bars required before every series in the pipeline set is valid.
pub fn warmup_bars(config: &StrategyConfig) -> usize {
    let adx = 2 * config.adx_period;
    let atr_mean = config.atr_period + config.atr_mean_period;
    200usize.max(adx).max(atr_mean).max(config.volume_period)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                symbol: "TEST".to_string(),
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "ema_21",
            vec![f64::NAN; 20]
                .into_iter()
                .chain(vec![100.0, 101.0])
                .collect::<Vec<_>>(),
        );
        assert!(iv.get("ema_21", 0).unwrap().is_nan());
        assert_eq!(iv.get("ema_21", 20), Some(100.0));
        assert_eq!(iv.get("ema_21", 21), Some(101.0));
        assert_eq!(iv.get("ema_21", 22), None); // out of bounds
    }

    #[test]
    fn get_valid_filters_nan() {
        let mut iv = IndicatorValues::new();
        iv.insert("atr_14", vec![f64::NAN, 2.0]);
        assert_eq!(iv.get_valid("atr_14", 0), None);
        assert_eq!(iv.get_valid("atr_14", 1), Some(2.0));
        assert_eq!(iv.get_valid("missing", 0), None);
    }

    #[test]
    fn precompute_produces_all_pipeline_series() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + (i as f64) * 0.1).collect();
        let bars = make_bars(&closes);
        let config = StrategyConfig::default();
        let values = precompute(&bars, &config);

        for key in [
            keys::EMA_9,
            keys::EMA_21,
            keys::EMA_50,
            keys::EMA_200,
            keys::ATR_14,
            keys::ATR_MEAN,
            keys::ADX_14,
            keys::SUPERTREND,
            keys::SUPERTREND_DIR,
            keys::RSI_14,
            keys::MACD,
            keys::MACD_SIGNAL,
            keys::VOLUME_MEAN,
        ] {
            let series = values.get_series(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(series.len(), bars.len(), "length mismatch for {key}");
        }
    }

    #[test]
    fn warmup_covers_slowest_series() {
        let config = StrategyConfig::default();
        let w = warmup_bars(&config);
        assert!(w >= 200);
        assert!(w >= 2 * config.adx_period);
    }
}
