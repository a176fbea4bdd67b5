//! Signal quality score.
//!
//! Five weighted components summing to at most 100: higher-timeframe
//! strength (25), proximity to a key level (25), confirmation count (20),
//! volatility state (15), and session (15). The minimum-quality gate is
//! applied by the caller so the breakdown stays observable in reports.

use crate::domain::{KeyLevel, Session, VolState};
use crate::levels::nearest_level;
use crate::pipeline::{BiasContext, Setup, VolContext};

/// Per-component scores; `total` is what the quality gate judges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityBreakdown {
    pub htf_strength: f64,
    pub level_quality: f64,
    pub confirmation: f64,
    pub volatility: f64,
    pub session: f64,
}

impl QualityBreakdown {
    pub fn total(&self) -> f64 {
        (self.htf_strength + self.level_quality + self.confirmation + self.volatility
            + self.session)
            .clamp(0.0, 100.0)
    }
}

pub fn quality(
    bias: &BiasContext,
    setup: &Setup,
    vol: &VolContext,
    levels: &[KeyLevel],
    entry: f64,
    atr: f64,
) -> QualityBreakdown {
    QualityBreakdown {
        htf_strength: (bias.adx / 50.0 * 25.0).clamp(0.0, 25.0),
        level_quality: level_quality(levels, entry, atr),
        confirmation: (setup.confirmations.len() as f64 * 10.0).min(20.0),
        volatility: match vol.state {
            VolState::Normal => 15.0,
            VolState::High => 8.0,
            VolState::Low => 5.0,
            VolState::UltraLow | VolState::Extreme => 0.0,
        },
        session: match vol.session {
            Session::London | Session::NewYork => 15.0,
            Session::Asian => 5.0,
            Session::Off => 0.0,
        },
    }
}

/// Full credit at the level itself, fading linearly to zero two ATRs away.
fn level_quality(levels: &[KeyLevel], entry: f64, atr: f64) -> f64 {
    if atr <= 0.0 {
        return 0.0;
    }
    match nearest_level(levels, entry) {
        Some(level) => {
            let distance_atr = level.distance(entry) / atr;
            (25.0 * (1.0 - distance_atr / 2.0)).clamp(0.0, 25.0)
        }
        None => 0.0,
    }
}
