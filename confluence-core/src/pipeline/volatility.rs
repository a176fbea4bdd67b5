//! Volatility state, relative volume, and session classification.
//!
//! The volatility state is the ratio of current ATR to its trailing mean:
//! a regime-free measure of whether the instrument is unusually quiet or
//! unusually wild right now. Both tails block trading.

use chrono::Timelike;

use crate::config::StrategyConfig;
use crate::domain::{Bar, Session, VolState};
use crate::indicators::{keys, IndicatorValues};
use crate::pipeline::{session_of, Veto};

/// Everything downstream stages need from this classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolContext {
    pub state: VolState,
    pub session: Session,
    /// Current ATR in price units; reused by the risk stage.
    pub atr: f64,
    /// Current volume relative to its trailing mean.
    pub relative_volume: f64,
    /// Relative volume at or above the spike multiple.
    pub volume_spike: bool,
}

/// Map an ATR ratio onto the five-state ladder.
pub fn vol_state(ratio: f64, config: &StrategyConfig) -> VolState {
    if ratio < config.vol_ultra_low {
        VolState::UltraLow
    } else if ratio < config.vol_low {
        VolState::Low
    } else if ratio > config.vol_extreme {
        VolState::Extreme
    } else if ratio > config.vol_high {
        VolState::High
    } else {
        VolState::Normal
    }
}

pub fn classify(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    config: &StrategyConfig,
) -> Result<VolContext, Veto> {
    let bar = bars.get(index).ok_or(Veto::InsufficientHistory)?;

    let atr = indicators
        .get_valid(keys::ATR_14, index)
        .ok_or(Veto::InsufficientHistory)?;
    let atr_mean = indicators
        .get_valid(keys::ATR_MEAN, index)
        .filter(|m| *m > 0.0)
        .ok_or(Veto::InsufficientHistory)?;

    let state = vol_state(atr / atr_mean, config);
    if state.blocks_trading() {
        return Err(Veto::ExtremeVolatility(state));
    }

    let volume_mean = indicators
        .get_valid(keys::VOLUME_MEAN, index)
        .filter(|m| *m > 0.0)
        .ok_or(Veto::InsufficientHistory)?;
    let relative_volume = bar.volume as f64 / volume_mean;
    if relative_volume < config.volume_floor_mult {
        return Err(Veto::ThinVolume {
            relative: relative_volume,
            floor: config.volume_floor_mult,
        });
    }

    Ok(VolContext {
        state,
        session: session_of(bar.timestamp.time().hour()),
        atr,
        relative_volume,
        volume_spike: relative_volume >= config.volume_spike_mult,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn fixture(volume: u64) -> (Vec<Bar>, IndicatorValues) {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars[2].volume = volume;
        let mut values = IndicatorValues::new();
        values.insert(keys::ATR_14, vec![f64::NAN, 1.0, 1.0]);
        values.insert(keys::ATR_MEAN, vec![f64::NAN, 1.0, 1.0]);
        values.insert(keys::VOLUME_MEAN, vec![f64::NAN, 1000.0, 1000.0]);
        (bars, values)
    }

    #[test]
    fn state_ladder() {
        let config = StrategyConfig::default();
        assert_eq!(vol_state(0.3, &config), VolState::UltraLow);
        assert_eq!(vol_state(0.5, &config), VolState::Low);
        assert_eq!(vol_state(1.0, &config), VolState::Normal);
        assert_eq!(vol_state(2.0, &config), VolState::High);
        assert_eq!(vol_state(3.0, &config), VolState::Extreme);
    }

    #[test]
    fn boundary_ratios_are_inclusive_of_normal() {
        let config = StrategyConfig::default();
        assert_eq!(vol_state(0.7, &config), VolState::Normal);
        assert_eq!(vol_state(1.5, &config), VolState::Normal);
    }

    #[test]
    fn normal_volatility_passes() {
        let config = StrategyConfig::default();
        let (bars, values) = fixture(1200);
        let ctx = classify(&bars, 2, &values, &config).unwrap();
        assert_eq!(ctx.state, VolState::Normal);
        assert!((ctx.relative_volume - 1.2).abs() < 1e-9);
        assert!(!ctx.volume_spike);
    }

    #[test]
    fn extreme_volatility_vetoes() {
        let config = StrategyConfig::default();
        let (bars, mut values) = fixture(1200);
        values.insert(keys::ATR_14, vec![f64::NAN, 1.0, 3.0]);
        assert_eq!(
            classify(&bars, 2, &values, &config),
            Err(Veto::ExtremeVolatility(VolState::Extreme))
        );
    }

    #[test]
    fn ultra_low_volatility_vetoes() {
        let config = StrategyConfig::default();
        let (bars, mut values) = fixture(1200);
        values.insert(keys::ATR_14, vec![f64::NAN, 1.0, 0.3]);
        assert_eq!(
            classify(&bars, 2, &values, &config),
            Err(Veto::ExtremeVolatility(VolState::UltraLow))
        );
    }

    #[test]
    fn thin_volume_vetoes() {
        let config = StrategyConfig::default();
        let (bars, values) = fixture(400); // 40% of the mean
        assert!(matches!(
            classify(&bars, 2, &values, &config),
            Err(Veto::ThinVolume { .. })
        ));
    }

    #[test]
    fn spike_detected_at_multiple() {
        let config = StrategyConfig::default();
        let (bars, values) = fixture(1300);
        let ctx = classify(&bars, 2, &values, &config).unwrap();
        assert!(ctx.volume_spike);
    }

    #[test]
    fn warmup_bars_veto() {
        let config = StrategyConfig::default();
        let (bars, values) = fixture(1200);
        assert_eq!(
            classify(&bars, 0, &values, &config),
            Err(Veto::InsufficientHistory)
        );
    }
}
