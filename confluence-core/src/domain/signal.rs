//! Signal and the enumerated market-state labels the pipeline derives.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Signed unit for price arithmetic: +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Trend regime derived from ADX against two fixed thresholds.
///
/// No memory across bars: the label is a pure function of the current ADX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Trend,
    Range,
    Neutral,
}

/// Higher-timeframe trend bias from EMA ordering plus ADX confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

/// Volatility state: ATR relative to its own trailing average.
///
/// `UltraLow` and `Extreme` block trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolState {
    UltraLow,
    Low,
    Normal,
    High,
    Extreme,
}

impl VolState {
    /// States in which no new position may be opened.
    pub fn blocks_trading(&self) -> bool {
        matches!(self, VolState::UltraLow | VolState::Extreme)
    }
}

/// Trading session by wall-clock UTC windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    Asian,
    London,
    NewYork,
    Off,
}

/// A fully specified candidate trade, produced at most once per bar.
///
/// Pure function of the current window, higher-timeframe context, and
/// configuration; nothing is carried forward between bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    /// Reward at TP1 divided by risk to the stop.
    pub risk_reward: f64,
    /// Weighted confidence score in [0, 100].
    pub quality: f64,
    pub regime: Regime,
    pub bias: Bias,
}

impl Signal {
    /// Distance from entry to the stop, always positive for a sane signal.
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss) * self.direction.sign()
    }
}
