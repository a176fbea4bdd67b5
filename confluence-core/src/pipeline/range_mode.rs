//! Range sub-pipeline: fading a tested range extreme back toward the mean.
//!
//! Only the bound on the bias side is faded (longs at the low under a
//! bullish bias, shorts at the high under a bearish one). A rejection
//! candle at the bound is mandatory; targets come from the range geometry
//! rather than ATR multiples.

use crate::candles;
use crate::config::StrategyConfig;
use crate::domain::{Bar, Bias, Direction};
use crate::indicators::{keys, IndicatorValues};
use crate::pipeline::{Confirmation, Setup, SetupKind, Veto, VolContext};

pub fn find_setup(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    bias: Bias,
    vol: &VolContext,
    config: &StrategyConfig,
) -> Result<Setup, Veto> {
    let direction = match bias {
        Bias::Bullish => Direction::Long,
        Bias::Bearish => Direction::Short,
        Bias::Neutral => return Err(Veto::NeutralBias),
    };

    if index < config.range_period {
        return Err(Veto::InsufficientHistory);
    }
    let window = &bars[index - config.range_period..index];
    let range_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let range_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let midpoint = (range_high + range_low) / 2.0;
    let tolerance = config.range_touch_atr * vol.atr;

    let bar = &bars[index];
    let (touched, rejected, structure, targets) = match direction {
        Direction::Long => (
            bar.low <= range_low + tolerance,
            candles::rejects_low(bars, index),
            range_low,
            (midpoint, range_high),
        ),
        Direction::Short => (
            bar.high >= range_high - tolerance,
            candles::rejects_high(bars, index),
            range_high,
            (midpoint, range_low),
        ),
    };

    if !touched {
        return Err(Veto::NoRangeTouch);
    }
    if !rejected {
        return Err(Veto::NoRejectionPattern);
    }

    let mut confirmations = vec![Confirmation::CandlePattern];
    if vol.volume_spike {
        confirmations.push(Confirmation::VolumeSpike);
    }
    if let Some(rsi) = indicators.get_valid(keys::RSI_14, index) {
        let stretched = match direction {
            Direction::Long => rsi <= 40.0,
            Direction::Short => rsi >= 60.0,
        };
        if stretched {
            confirmations.push(Confirmation::RsiInBand);
        }
    }

    Ok(Setup {
        direction,
        kind: SetupKind::RangeFade,
        structure,
        confirmations,
        targets: Some(targets),
    })
}
