//! Alert conditions and payload formatting.
//!
//! The host owns the actual alert delivery; this module only decides which
//! named conditions a signal satisfies and renders the text payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Direction, Signal};

/// Named alert conditions a host can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Buy,
    Sell,
    Any,
}

impl AlertKind {
    pub fn matches(&self, signal: &Signal) -> bool {
        match self {
            AlertKind::Buy => signal.direction == Direction::Long,
            AlertKind::Sell => signal.direction == Direction::Short,
            AlertKind::Any => true,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertKind::Buy => "BUY",
            AlertKind::Sell => "SELL",
            AlertKind::Any => "ANY",
        })
    }
}

/// Render the alert payload for a signal.
pub fn payload(signal: &Signal) -> String {
    let side = match signal.direction {
        Direction::Long => "BUY",
        Direction::Short => "SELL",
    };
    format!(
        "{side} {symbol} @ {entry:.4} | SL {sl:.4} | TP1 {tp1:.4} TP2 {tp2:.4} | RR {rr:.2} | Q {quality:.0}",
        symbol = signal.symbol,
        entry = signal.entry,
        sl = signal.stop_loss,
        tp1 = signal.take_profit_1,
        tp2 = signal.take_profit_2,
        rr = signal.risk_reward,
        quality = signal.quality,
    )
}

/// All conditions the signal fires, with their payloads.
pub fn fired(signal: &Signal) -> Vec<(AlertKind, String)> {
    let text = payload(signal);
    let directional = match signal.direction {
        Direction::Long => AlertKind::Buy,
        Direction::Short => AlertKind::Sell,
    };
    vec![(directional, text.clone()), (AlertKind::Any, text)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bias, Regime};
    use chrono::NaiveDate;

    fn signal(direction: Direction) -> Signal {
        Signal {
            symbol: "EURUSD".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            direction,
            entry: 1.0850,
            stop_loss: 1.0800,
            take_profit_1: 1.0975,
            take_profit_2: 1.1050,
            risk_reward: 2.5,
            quality: 78.0,
            regime: Regime::Trend,
            bias: Bias::Bullish,
        }
    }

    #[test]
    fn buy_matches_long_only() {
        let long = signal(Direction::Long);
        let short = signal(Direction::Short);
        assert!(AlertKind::Buy.matches(&long));
        assert!(!AlertKind::Buy.matches(&short));
        assert!(AlertKind::Sell.matches(&short));
        assert!(AlertKind::Any.matches(&long));
        assert!(AlertKind::Any.matches(&short));
    }

    #[test]
    fn payload_carries_trade_facts() {
        let text = payload(&signal(Direction::Long));
        assert!(text.starts_with("BUY EURUSD"));
        assert!(text.contains("SL 1.0800"));
        assert!(text.contains("TP1 1.0975"));
        assert!(text.contains("TP2 1.1050"));
        assert!(text.contains("RR 2.50"));
        assert!(text.contains("Q 78"));
    }

    #[test]
    fn fired_includes_directional_and_any() {
        let alerts = fired(&signal(Direction::Short));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].0, AlertKind::Sell);
        assert_eq!(alerts[1].0, AlertKind::Any);
        assert!(alerts[0].1.starts_with("SELL"));
    }
}
