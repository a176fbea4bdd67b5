//! Trend sub-pipeline: pullback and breakout setups in the bias direction.
//!
//! A pullback needs the full EMA stack aligned with price touching the
//! EMA21 and closing back on the trend side. A breakout needs a close
//! beyond the recent structure extreme. Either way the setup must gather
//! enough independent confirmations, and a pierce-and-reject at a major
//! level directly overhead (or underfoot, for shorts) kills it as a
//! suspected trap.

use crate::candles;
use crate::config::StrategyConfig;
use crate::domain::{Bar, Bias, Direction, KeyLevel};
use crate::indicators::{keys, IndicatorValues};
use crate::pipeline::{Confirmation, Setup, SetupKind, Veto, VolContext};

pub fn find_setup(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    bias: Bias,
    vol: &VolContext,
    levels: &[KeyLevel],
    config: &StrategyConfig,
) -> Result<Setup, Veto> {
    let direction = match bias {
        Bias::Bullish => Direction::Long,
        Bias::Bearish => Direction::Short,
        Bias::Neutral => return Err(Veto::NeutralBias),
    };

    let bar = &bars[index];
    let ema_9 = valid(indicators, keys::EMA_9, index)?;
    let ema_21 = valid(indicators, keys::EMA_21, index)?;
    let ema_50 = valid(indicators, keys::EMA_50, index)?;
    let ema_200 = valid(indicators, keys::EMA_200, index)?;

    let kind = match direction {
        Direction::Long => {
            let stacked = ema_9 > ema_21 && ema_21 > ema_50 && bar.close > ema_200;
            if stacked && bar.low <= ema_21 && bar.close > ema_21 {
                Some(SetupKind::TrendPullback)
            } else if breaks_recent_high(bars, index, config.structure_period) {
                Some(SetupKind::TrendBreakout)
            } else {
                None
            }
        }
        Direction::Short => {
            let stacked = ema_9 < ema_21 && ema_21 < ema_50 && bar.close < ema_200;
            if stacked && bar.high >= ema_21 && bar.close < ema_21 {
                Some(SetupKind::TrendPullback)
            } else if breaks_recent_low(bars, index, config.structure_period) {
                Some(SetupKind::TrendBreakout)
            } else {
                None
            }
        }
    };
    let kind = kind.ok_or(Veto::NoSetup)?;

    if let Some(level) = trap_level(bar, levels, direction, vol.atr) {
        return Err(Veto::TrapSuspected { level });
    }

    let confirmations = gather_confirmations(bars, index, indicators, direction, vol);
    if confirmations.len() < config.min_confirmations {
        return Err(Veto::NoConfirmation {
            count: confirmations.len(),
            required: config.min_confirmations,
        });
    }

    let structure = match direction {
        Direction::Long => recent_extreme(bars, index, config.structure_period, |b| b.low, f64::min),
        Direction::Short => {
            recent_extreme(bars, index, config.structure_period, |b| b.high, f64::max)
        }
    };

    Ok(Setup {
        direction,
        kind,
        structure,
        confirmations,
        targets: None,
    })
}

fn valid(indicators: &IndicatorValues, key: &str, index: usize) -> Result<f64, Veto> {
    indicators
        .get_valid(key, index)
        .ok_or(Veto::InsufficientHistory)
}

/// Close above the highest high of the prior `period` bars.
fn breaks_recent_high(bars: &[Bar], index: usize, period: usize) -> bool {
    if index < period {
        return false;
    }
    let prior_high = bars[index - period..index]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    bars[index].close > prior_high
}

/// Close below the lowest low of the prior `period` bars.
fn breaks_recent_low(bars: &[Bar], index: usize, period: usize) -> bool {
    if index < period {
        return false;
    }
    let prior_low = bars[index - period..index]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    bars[index].close < prior_low
}

/// Extreme of the trailing structure window, current bar included.
fn recent_extreme(
    bars: &[Bar],
    index: usize,
    period: usize,
    pick: impl Fn(&Bar) -> f64,
    fold: impl Fn(f64, f64) -> f64,
) -> f64 {
    let start = (index + 1).saturating_sub(period);
    bars[start..=index]
        .iter()
        .map(pick)
        .reduce(fold)
        .unwrap_or(f64::NAN)
}

/// A major level within one ATR of the close that the bar pierced intrabar
/// and then closed back on the wrong side of.
fn trap_level(bar: &Bar, levels: &[KeyLevel], direction: Direction, atr: f64) -> Option<f64> {
    levels
        .iter()
        .filter(|l| l.kind.is_major())
        .find(|l| match direction {
            Direction::Long => {
                bar.high > l.price && bar.close < l.price && l.price - bar.close <= atr
            }
            Direction::Short => {
                bar.low < l.price && bar.close > l.price && bar.close - l.price <= atr
            }
        })
        .map(|l| l.price)
}

fn gather_confirmations(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    direction: Direction,
    vol: &VolContext,
) -> Vec<Confirmation> {
    let mut confirmations = Vec::new();

    let candle = match direction {
        Direction::Long => {
            candles::bullish_engulfing(bars, index) || candles::hammer(&bars[index])
        }
        Direction::Short => {
            candles::bearish_engulfing(bars, index) || candles::shooting_star(&bars[index])
        }
    };
    if candle {
        confirmations.push(Confirmation::CandlePattern);
    }

    if vol.volume_spike {
        confirmations.push(Confirmation::VolumeSpike);
    }

    if let Some(rsi) = indicators.get_valid(keys::RSI_14, index) {
        let in_band = match direction {
            Direction::Long => (40.0..70.0).contains(&rsi),
            Direction::Short => (30.0..60.0).contains(&rsi),
        };
        if in_band {
            confirmations.push(Confirmation::RsiInBand);
        }
    }

    if let (Some(macd), Some(signal)) = (
        indicators.get_valid(keys::MACD, index),
        indicators.get_valid(keys::MACD_SIGNAL, index),
    ) {
        let aligned = match direction {
            Direction::Long => macd > signal,
            Direction::Short => macd < signal,
        };
        if aligned {
            confirmations.push(Confirmation::MacdAligned);
        }
    }

    if let Some(st_dir) = indicators.get_valid(keys::SUPERTREND_DIR, index) {
        let aligned = match direction {
            Direction::Long => st_dir > 0.0,
            Direction::Short => st_dir < 0.0,
        };
        if aligned {
            confirmations.push(Confirmation::SupertrendAligned);
        }
    }

    confirmations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LevelKind, Session, VolState};
    use crate::indicators::make_bars;

    fn vol_ctx(spike: bool) -> VolContext {
        VolContext {
            state: VolState::Normal,
            session: Session::London,
            atr: 1.0,
            relative_volume: if spike { 1.5 } else { 1.0 },
            volume_spike: spike,
        }
    }

    fn constant(n: usize, value: f64) -> Vec<f64> {
        vec![value; n]
    }

    /// Uptrending bars where the last bar dips to the EMA21 and recovers.
    fn pullback_fixture() -> (Vec<Bar>, IndicatorValues) {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let mut bars = make_bars(&closes);
        let n = bars.len();
        // Last bar: low tags the EMA21 at 106, close holds above.
        bars[n - 1].low = 105.8;
        bars[n - 1].close = 108.5;

        let mut values = IndicatorValues::new();
        values.insert(keys::EMA_9, constant(n, 107.0));
        values.insert(keys::EMA_21, constant(n, 106.0));
        values.insert(keys::EMA_50, constant(n, 104.0));
        values.insert(keys::EMA_200, constant(n, 100.0));
        values.insert(keys::RSI_14, constant(n, 55.0));
        values.insert(keys::MACD, constant(n, 0.5));
        values.insert(keys::MACD_SIGNAL, constant(n, 0.3));
        values.insert(keys::SUPERTREND_DIR, constant(n, 1.0));
        (bars, values)
    }

    #[test]
    fn detects_long_pullback() {
        let config = StrategyConfig::default();
        let (bars, values) = pullback_fixture();
        let setup = find_setup(
            &bars,
            bars.len() - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        )
        .unwrap();
        assert_eq!(setup.kind, SetupKind::TrendPullback);
        assert_eq!(setup.direction, Direction::Long);
        assert!(setup.confirmations.contains(&Confirmation::RsiInBand));
        assert!(setup.confirmations.contains(&Confirmation::MacdAligned));
        assert!(setup
            .confirmations
            .contains(&Confirmation::SupertrendAligned));
        assert!(setup.targets.is_none());
    }

    #[test]
    fn detects_long_breakout() {
        let config = StrategyConfig::default();
        let (mut bars, mut values) = pullback_fixture();
        let n = bars.len();
        // Break the EMA stack so the pullback branch cannot fire, then
        // close above every prior high.
        values.insert(keys::EMA_9, constant(n, 105.0));
        bars[n - 1].open = 110.2;
        bars[n - 1].low = 110.0;
        bars[n - 1].close = 120.0;
        bars[n - 1].high = 120.5;
        let setup = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        )
        .unwrap();
        assert_eq!(setup.kind, SetupKind::TrendBreakout);
    }

    #[test]
    fn no_setup_without_pullback_or_breakout() {
        let config = StrategyConfig::default();
        let (mut bars, values) = pullback_fixture();
        let n = bars.len();
        // Close well above the EMA21 without having touched it.
        bars[n - 1].low = 108.0;
        bars[n - 1].close = 108.5;
        let result = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        );
        assert_eq!(result.unwrap_err(), Veto::NoSetup);
    }

    #[test]
    fn too_few_confirmations_veto() {
        let config = StrategyConfig::default();
        let (bars, mut values) = pullback_fixture();
        let n = bars.len();
        // Strip every confirmation source except the supertrend.
        values.insert(keys::RSI_14, constant(n, 80.0));
        values.insert(keys::MACD, constant(n, 0.1));
        values.insert(keys::MACD_SIGNAL, constant(n, 0.3));
        let result = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        );
        assert_eq!(
            result.unwrap_err(),
            Veto::NoConfirmation {
                count: 1,
                required: 2
            }
        );
    }

    #[test]
    fn trap_at_major_level_veto() {
        let config = StrategyConfig::default();
        let (mut bars, values) = pullback_fixture();
        let n = bars.len();
        // Wick through the prior-day high at 109 and close back below it.
        bars[n - 1].high = 109.4;
        let levels = vec![KeyLevel::new(LevelKind::PriorDayHigh, 109.0)];
        let result = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &levels,
            &config,
        );
        assert_eq!(result.unwrap_err(), Veto::TrapSuspected { level: 109.0 });
    }

    #[test]
    fn minor_level_is_not_a_trap() {
        let config = StrategyConfig::default();
        let (mut bars, values) = pullback_fixture();
        let n = bars.len();
        bars[n - 1].high = 109.4;
        // Round numbers are not major levels.
        let levels = vec![KeyLevel::new(LevelKind::RoundNumber, 109.0)];
        assert!(find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &levels,
            &config,
        )
        .is_ok());
    }

    #[test]
    fn structure_is_window_low_for_longs() {
        let config = StrategyConfig::default();
        let (mut bars, values) = pullback_fixture();
        let n = bars.len();
        bars[n - 3].low = 90.0; // deepest low inside the 5-bar window
        let setup = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        )
        .unwrap();
        assert_eq!(setup.structure, 90.0);
    }

    #[test]
    fn short_pullback_mirrors_long() {
        let config = StrategyConfig::default();
        let closes: Vec<f64> = (0..10).map(|i| 120.0 - i as f64).collect();
        let mut bars = make_bars(&closes);
        let n = bars.len();
        bars[n - 1].high = 114.2;
        bars[n - 1].close = 111.5;

        let mut values = IndicatorValues::new();
        values.insert(keys::EMA_9, constant(n, 113.0));
        values.insert(keys::EMA_21, constant(n, 114.0));
        values.insert(keys::EMA_50, constant(n, 116.0));
        values.insert(keys::EMA_200, constant(n, 125.0));
        values.insert(keys::RSI_14, constant(n, 40.0));
        values.insert(keys::MACD, constant(n, -0.5));
        values.insert(keys::MACD_SIGNAL, constant(n, -0.3));
        values.insert(keys::SUPERTREND_DIR, constant(n, -1.0));

        let setup = find_setup(
            &bars,
            n - 1,
            &values,
            Bias::Bearish,
            &vol_ctx(false),
            &[],
            &config,
        )
        .unwrap();
        assert_eq!(setup.direction, Direction::Short);
        assert_eq!(setup.kind, SetupKind::TrendPullback);
    }

    #[test]
    fn missing_ema_is_insufficient_history() {
        let config = StrategyConfig::default();
        let (bars, mut values) = pullback_fixture();
        values.insert(keys::EMA_200, vec![f64::NAN; bars.len()]);
        let result = find_setup(
            &bars,
            bars.len() - 1,
            &values,
            Bias::Bullish,
            &vol_ctx(false),
            &[],
            &config,
        );
        assert_eq!(result.unwrap_err(), Veto::InsufficientHistory);
    }
}
