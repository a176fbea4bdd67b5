//! Regime router.
//!
//! ADX below the range threshold routes to the range sub-pipeline, above
//! the trend threshold to the trend sub-pipeline. The band in between is
//! deliberately neutral: a transitioning market produces no signal at all.

use crate::config::StrategyConfig;
use crate::domain::Regime;

pub fn classify(adx: f64, config: &StrategyConfig) -> Regime {
    if adx < config.adx_range_threshold {
        Regime::Range
    } else if adx > config.adx_trend_threshold {
        Regime::Trend
    } else {
        Regime::Neutral
    }
}
