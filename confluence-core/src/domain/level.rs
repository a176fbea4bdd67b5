//! Key levels — labeled reference prices recomputed per session.

use serde::{Deserialize, Serialize};

/// The provenance of a key level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    PriorDayHigh,
    PriorDayLow,
    PriorWeekHigh,
    PriorWeekLow,
    SessionOpen,
    RoundNumber,
    Pivot,
    PivotR1,
    PivotS1,
}

impl LevelKind {
    /// Levels that count as "major" structure for the no-trade overlay.
    ///
    /// Round numbers and the session open are reference points for quality
    /// scoring but do not by themselves block a trade path.
    pub fn is_major(&self) -> bool {
        !matches!(self, LevelKind::RoundNumber | LevelKind::SessionOpen)
    }
}

/// A labeled price, read-only reference for distance and quality checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLevel {
    pub kind: LevelKind,
    pub price: f64,
}

impl KeyLevel {
    pub fn new(kind: LevelKind, price: f64) -> Self {
        Self { kind, price }
    }

    /// Absolute distance from a price to this level.
    pub fn distance(&self, price: f64) -> f64 {
        (self.price - price).abs()
    }

    /// True if the level lies strictly between the two prices (either order).
    pub fn is_between(&self, a: f64, b: f64) -> bool {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.price > lo && self.price < hi
    }
}
