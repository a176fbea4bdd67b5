//! Higher-timeframe bias.
//!
//! Bias is read from the last *closed* higher-timeframe bar only: EMA50
//! above EMA200 with sufficient ADX is bullish, the mirror is bearish,
//! everything else is neutral and ends the evaluation. Signals never trade
//! against the resolved bias.

use crate::config::StrategyConfig;
use crate::domain::{Bias, Direction};
use crate::htf::HtfContext;
use crate::pipeline::Veto;

/// Resolved bias plus the higher-timeframe ADX feeding the quality score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasContext {
    pub bias: Bias,
    pub adx: f64,
}

impl BiasContext {
    /// The only direction a signal may take under this bias.
    pub fn direction(&self) -> Option<Direction> {
        match self.bias {
            Bias::Bullish => Some(Direction::Long),
            Bias::Bearish => Some(Direction::Short),
            Bias::Neutral => None,
        }
    }
}

pub fn resolve(htf: &HtfContext, index: usize, config: &StrategyConfig) -> Result<BiasContext, Veto> {
    let snapshot = htf
        .at(index)
        .filter(|s| s.is_valid())
        .ok_or(Veto::InsufficientHistory)?;

    let bias = if snapshot.adx < config.htf_adx_threshold {
        Bias::Neutral
    } else if snapshot.ema_fast > snapshot.ema_slow {
        Bias::Bullish
    } else if snapshot.ema_fast < snapshot.ema_slow {
        Bias::Bearish
    } else {
        Bias::Neutral
    };

    if bias == Bias::Neutral {
        return Err(Veto::NeutralBias);
    }

    Ok(BiasContext {
        bias,
        adx: snapshot.adx,
    })
}
