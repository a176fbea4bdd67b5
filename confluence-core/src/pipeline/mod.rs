//! Per-bar evaluation pipeline.
//!
//! A single linear AND-gate chain: each stage either passes its context
//! forward or terminates the evaluation with a `Veto` naming the reason.
//! There is no retry, no backtracking, and no state carried between bars:
//! `evaluate` is a pure function of the window, the precomputed indicator
//! series, the higher-timeframe context, and the configuration.
//!
//! Stage order:
//! 1. market gate (spread / symbol)
//! 2. volatility & session classifier
//! 3. higher-timeframe bias
//! 4. regime router → trend or range sub-pipeline
//! 5. risk plan (stop, targets, risk:reward)
//! 6. quality score
//! 7. global no-trade overlay

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StrategyConfig;
use crate::domain::{Bar, Direction, Regime, Session, Signal, VolState};
use crate::htf::HtfContext;
use crate::indicators::{keys, IndicatorValues};
use crate::levels;

pub mod bias;
pub mod gate;
pub mod overlay;
pub mod range_mode;
pub mod regime;
pub mod risk;
pub mod score;
pub mod trend;
pub mod volatility;

pub use bias::BiasContext;
pub use score::QualityBreakdown;
pub use volatility::VolContext;

/// Why an evaluation produced no signal.
///
/// Every terminating stage names its reason; the backtest loop and the scan
/// surface both report these verbatim.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Veto {
    #[error("spread {spread} exceeds configured maximum {max}")]
    SpreadTooWide { spread: f64, max: f64 },
    #[error("instrument '{actual}' does not match expected '{expected}'")]
    SymbolMismatch { expected: String, actual: String },
    #[error("insufficient history for a valid evaluation")]
    InsufficientHistory,
    #[error("volatility state {0:?} blocks trading")]
    ExtremeVolatility(VolState),
    #[error("relative volume {relative:.2} below floor {floor:.2}")]
    ThinVolume { relative: f64, floor: f64 },
    #[error("higher-timeframe bias is neutral")]
    NeutralBias,
    #[error("ADX {adx:.1} inside the neutral band; no regime")]
    NeutralRegime { adx: f64 },
    #[error("no valid setup at this bar")]
    NoSetup,
    #[error("{count} confirmations, {required} required")]
    NoConfirmation { count: usize, required: usize },
    #[error("suspected false breakout at level {level}")]
    TrapSuspected { level: f64 },
    #[error("price not at a range extreme")]
    NoRangeTouch,
    #[error("no rejection pattern at the range bound")]
    NoRejectionPattern,
    #[error("risk:reward {rr:.2} below minimum {min:.2}")]
    RiskRewardTooLow { rr: f64, min: f64 },
    #[error("quality {score:.0} below minimum {min:.0}")]
    QualityTooLow { score: f64, min: f64 },
    #[error("major level {level} sits between entry and first target")]
    LevelInPath { level: f64 },
}

impl Veto {
    /// Stable short label for tallies and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Veto::SpreadTooWide { .. } => "spread",
            Veto::SymbolMismatch { .. } => "symbol",
            Veto::InsufficientHistory => "history",
            Veto::ExtremeVolatility(_) => "volatility",
            Veto::ThinVolume { .. } => "thin_volume",
            Veto::NeutralBias => "neutral_bias",
            Veto::NeutralRegime { .. } => "neutral_regime",
            Veto::NoSetup => "no_setup",
            Veto::NoConfirmation { .. } => "no_confirmation",
            Veto::TrapSuspected { .. } => "trap",
            Veto::NoRangeTouch => "no_range_touch",
            Veto::NoRejectionPattern => "no_rejection",
            Veto::RiskRewardTooLow { .. } => "risk_reward",
            Veto::QualityTooLow { .. } => "quality",
            Veto::LevelInPath { .. } => "level_in_path",
        }
    }
}

/// Per-evaluation market facts that do not live in the bar series:
/// the instrument identity and the current spread estimate.
#[derive(Debug, Clone)]
pub struct MarketInfo<'a> {
    pub symbol: &'a str,
    pub spread: f64,
}

/// How the setup was found; recorded for scoring and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupKind {
    TrendPullback,
    TrendBreakout,
    RangeFade,
}

/// Independent conditions supporting a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    CandlePattern,
    VolumeSpike,
    RsiInBand,
    MacdAligned,
    SupertrendAligned,
}

/// Output of a sub-pipeline: where the trade would be and what supports it.
#[derive(Debug, Clone)]
pub struct Setup {
    pub direction: Direction,
    pub kind: SetupKind,
    /// The triggering structure price the stop is anchored beyond
    /// (recent swing for trend setups, the faded bound for range setups).
    pub structure: f64,
    pub confirmations: Vec<Confirmation>,
    /// Level-based targets (TP1, TP2) for range setups; trend setups use
    /// ATR multiples instead.
    pub targets: Option<(f64, f64)>,
}

/// Stop, targets, and risk:reward for a candidate trade.
#[derive(Debug, Clone, Copy)]
pub struct TradePlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub risk_reward: f64,
}

/// Evaluate one bar. Returns the signal or the veto that stopped the chain.
pub fn evaluate(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    htf: &HtfContext,
    market: &MarketInfo,
    config: &StrategyConfig,
) -> Result<Signal, Veto> {
    let bar = bars.get(index).ok_or(Veto::InsufficientHistory)?;
    if !bar.is_sane() {
        return Err(Veto::InsufficientHistory);
    }

    gate::check(market, config)?;

    let vol = volatility::classify(bars, index, indicators, config)?;
    let bias_ctx = bias::resolve(htf, index, config)?;

    let adx = indicators
        .get_valid(keys::ADX_14, index)
        .ok_or(Veto::InsufficientHistory)?;
    let regime = regime::classify(adx, config);

    let key_levels = levels::key_levels(bars, index);

    let setup = match regime {
        Regime::Neutral => return Err(Veto::NeutralRegime { adx }),
        Regime::Trend => {
            trend::find_setup(bars, index, indicators, bias_ctx.bias, &vol, &key_levels, config)?
        }
        Regime::Range => range_mode::find_setup(bars, index, indicators, bias_ctx.bias, &vol, config)?,
    };

    let plan = risk::plan(bar, &setup, vol.atr, config)?;

    let breakdown = score::quality(&bias_ctx, &setup, &vol, &key_levels, plan.entry, vol.atr);
    let quality = breakdown.total();
    if quality < config.min_quality {
        return Err(Veto::QualityTooLow {
            score: quality,
            min: config.min_quality,
        });
    }

    overlay::check(&plan, &key_levels, &vol, config)?;

    Ok(Signal {
        symbol: bar.symbol.clone(),
        timestamp: bar.timestamp,
        direction: setup.direction,
        entry: plan.entry,
        stop_loss: plan.stop_loss,
        take_profit_1: plan.take_profit_1,
        take_profit_2: plan.take_profit_2,
        risk_reward: plan.risk_reward,
        quality,
        regime,
        bias: bias_ctx.bias,
    })
}

/// Convenience wrapper for callers that only care whether a signal fired.
pub fn evaluate_opt(
    bars: &[Bar],
    index: usize,
    indicators: &IndicatorValues,
    htf: &HtfContext,
    market: &MarketInfo,
    config: &StrategyConfig,
) -> Option<Signal> {
    evaluate(bars, index, indicators, htf, market, config).ok()
}

/// Session classification by wall-clock UTC windows.
pub fn session_of(hour: u32) -> Session {
    match hour {
        0..=7 => Session::Asian,
        8..=12 => Session::London,
        13..=20 => Session::NewYork,
        _ => Session::Off,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_windows() {
        assert_eq!(session_of(3), Session::Asian);
        assert_eq!(session_of(8), Session::London);
        assert_eq!(session_of(12), Session::London);
        assert_eq!(session_of(14), Session::NewYork);
        assert_eq!(session_of(22), Session::Off);
    }

    #[test]
    fn veto_messages_are_descriptive() {
        let veto = Veto::SpreadTooWide {
            spread: 0.08,
            max: 0.05,
        };
        assert!(veto.to_string().contains("0.08"));
        let veto = Veto::QualityTooLow {
            score: 55.0,
            min: 60.0,
        };
        assert!(veto.to_string().contains("55"));
    }

    #[test]
    fn veto_serialization_roundtrip() {
        let veto = Veto::NeutralRegime { adx: 20.0 };
        let json = serde_json::to_string(&veto).unwrap();
        let deser: Veto = serde_json::from_str(&json).unwrap();
        assert_eq!(veto, deser);
    }
}
