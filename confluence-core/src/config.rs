//! Strategy configuration — every tunable the pipeline reads.
//!
//! All settings are simple scalars/enums. `validate()` rejects inconsistent
//! values at startup with a descriptive message; the pipeline itself never
//! validates configuration per bar.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::htf::Timeframe;

/// Errors raised by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_risk_reward must be > 0, got {0}")]
    NonPositiveRiskReward(f64),
    #[error("min_quality must be within [0, 100], got {0}")]
    QualityOutOfRange(f64),
    #[error("max_spread must be >= 0, got {0}")]
    NegativeSpread(f64),
    #[error("adx_range_threshold ({range}) must be below adx_trend_threshold ({trend})")]
    AdxThresholdsInverted { range: f64, trend: f64 },
    #[error("volatility thresholds must be strictly increasing: {0:?}")]
    VolThresholdsNotIncreasing([f64; 4]),
    #[error("take-profit multiples must satisfy 0 < tp1_atr < tp2_atr, got {tp1} / {tp2}")]
    TakeProfitsInverted { tp1: f64, tp2: f64 },
    #[error("{name} must be >= 1, got {value}")]
    PeriodTooShort { name: &'static str, value: usize },
    #[error("volume_floor_mult ({floor}) must be below volume_spike_mult ({spike})")]
    VolumeMultsInverted { floor: f64, spike: f64 },
}

/// Strategy configuration shared by the charting-style `scan` surface and
/// the backtest loop. Defaults follow the reference parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Higher timeframe used for the bias block.
    pub higher_timeframe: Timeframe,
    /// Expected instrument; evaluations for any other symbol are rejected.
    /// `None` accepts any symbol.
    pub expected_symbol: Option<String>,
    /// Maximum tolerated spread estimate (absolute price units).
    pub max_spread: f64,

    // Indicator periods
    pub adx_period: usize,
    pub atr_period: usize,
    pub atr_mean_period: usize,
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
    pub volume_period: usize,

    // Regime routing
    pub adx_range_threshold: f64,
    pub adx_trend_threshold: f64,
    /// ADX confirmation floor on the higher timeframe.
    pub htf_adx_threshold: f64,

    // Volatility state thresholds (ATR / trailing mean ATR)
    pub vol_ultra_low: f64,
    pub vol_low: f64,
    pub vol_high: f64,
    pub vol_extreme: f64,

    // Volume gates
    pub volume_spike_mult: f64,
    pub volume_floor_mult: f64,

    // Setup detection
    pub structure_period: usize,
    pub range_period: usize,
    /// Tolerance (in ATRs) for "price touches a range bound".
    pub range_touch_atr: f64,
    pub min_confirmations: usize,

    // Risk management
    /// Stop buffer beyond the triggering structure, in ATRs.
    pub sl_buffer_atr: f64,
    /// Minimum stop distance from entry, in ATRs.
    pub sl_min_atr: f64,
    pub tp1_atr: f64,
    pub tp2_atr: f64,
    pub min_risk_reward: f64,

    // Quality gate
    pub min_quality: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            higher_timeframe: Timeframe::H4,
            expected_symbol: None,
            max_spread: 0.05,
            adx_period: 14,
            atr_period: 14,
            atr_mean_period: 50,
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            volume_period: 20,
            adx_range_threshold: 18.0,
            adx_trend_threshold: 22.0,
            htf_adx_threshold: 20.0,
            vol_ultra_low: 0.4,
            vol_low: 0.7,
            vol_high: 1.5,
            vol_extreme: 2.5,
            volume_spike_mult: 1.3,
            volume_floor_mult: 0.5,
            structure_period: 5,
            range_period: 20,
            range_touch_atr: 0.25,
            min_confirmations: 2,
            sl_buffer_atr: 0.2,
            sl_min_atr: 1.2,
            tp1_atr: 2.5,
            tp2_atr: 4.0,
            min_risk_reward: 2.0,
            min_quality: 60.0,
        }
    }
}

impl StrategyConfig {
    /// Reject inconsistent settings. Called once at startup; a passing
    /// config is assumed valid for the rest of the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_risk_reward <= 0.0 {
            return Err(ConfigError::NonPositiveRiskReward(self.min_risk_reward));
        }
        if !(0.0..=100.0).contains(&self.min_quality) {
            return Err(ConfigError::QualityOutOfRange(self.min_quality));
        }
        if self.max_spread < 0.0 {
            return Err(ConfigError::NegativeSpread(self.max_spread));
        }
        if self.adx_range_threshold >= self.adx_trend_threshold {
            return Err(ConfigError::AdxThresholdsInverted {
                range: self.adx_range_threshold,
                trend: self.adx_trend_threshold,
            });
        }
        let vol = [
            self.vol_ultra_low,
            self.vol_low,
            self.vol_high,
            self.vol_extreme,
        ];
        if !vol.windows(2).all(|w| w[0] < w[1]) || vol[0] <= 0.0 {
            return Err(ConfigError::VolThresholdsNotIncreasing(vol));
        }
        if self.tp1_atr <= 0.0 || self.tp1_atr >= self.tp2_atr {
            return Err(ConfigError::TakeProfitsInverted {
                tp1: self.tp1_atr,
                tp2: self.tp2_atr,
            });
        }
        if self.volume_floor_mult >= self.volume_spike_mult {
            return Err(ConfigError::VolumeMultsInverted {
                floor: self.volume_floor_mult,
                spike: self.volume_spike_mult,
            });
        }
        for (name, value) in [
            ("adx_period", self.adx_period),
            ("atr_period", self.atr_period),
            ("atr_mean_period", self.atr_mean_period),
            ("supertrend_period", self.supertrend_period),
            ("volume_period", self.volume_period),
            ("structure_period", self.structure_period),
            ("range_period", self.range_period),
        ] {
            if value < 1 {
                return Err(ConfigError::PeriodTooShort { name, value });
            }
        }
        Ok(())
    }
}
