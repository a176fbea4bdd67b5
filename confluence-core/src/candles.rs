//! Candlestick pattern detection.
//!
//! Definitions follow the usual body/wick ratios: an engulfing candle must
//! wrap the prior bar's body; hammer and shooting star need a wick at least
//! twice the body with the opposite wick under half the body.

use crate::domain::Bar;

/// Current bar is bullish and engulfs the prior bearish body.
pub fn bullish_engulfing(bars: &[Bar], index: usize) -> bool {
    if index == 0 || index >= bars.len() {
        return false;
    }
    let prev = &bars[index - 1];
    let cur = &bars[index];
    cur.is_bullish() && prev.is_bearish() && cur.close > prev.open && cur.open < prev.close
}

/// Current bar is bearish and engulfs the prior bullish body.
pub fn bearish_engulfing(bars: &[Bar], index: usize) -> bool {
    if index == 0 || index >= bars.len() {
        return false;
    }
    let prev = &bars[index - 1];
    let cur = &bars[index];
    cur.is_bearish() && prev.is_bullish() && cur.close < prev.open && cur.open > prev.close
}

/// Long lower wick, tiny upper wick: buyers rejected the low.
pub fn hammer(bar: &Bar) -> bool {
    let body = bar.body();
    body > 0.0 && bar.lower_wick() > body * 2.0 && bar.upper_wick() < body * 0.5
}

/// Long upper wick, tiny lower wick: sellers rejected the high.
pub fn shooting_star(bar: &Bar) -> bool {
    let body = bar.body();
    body > 0.0 && bar.upper_wick() > body * 2.0 && bar.lower_wick() < body * 0.5
}

/// A bullish rejection at a low: hammer or bullish engulfing.
pub fn rejects_low(bars: &[Bar], index: usize) -> bool {
    bars.get(index).is_some_and(hammer) || bullish_engulfing(bars, index)
}

/// A bearish rejection at a high: shooting star or bearish engulfing.
pub fn rejects_high(bars: &[Bar], index: usize) -> bool {
    bars.get(index).is_some_and(shooting_star) || bearish_engulfing(bars, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            symbol: "TEST".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn detects_bullish_engulfing() {
        let bars = vec![
            bar(102.0, 102.5, 99.5, 100.0), // bearish
            bar(99.8, 103.0, 99.5, 102.5),  // bullish, wraps prior body
        ];
        assert!(bullish_engulfing(&bars, 1));
        assert!(!bearish_engulfing(&bars, 1));
    }

    #[test]
    fn engulfing_requires_prior_opposite_body() {
        let bars = vec![
            bar(100.0, 102.5, 99.5, 102.0), // bullish, not bearish
            bar(99.8, 103.0, 99.5, 102.5),
        ];
        assert!(!bullish_engulfing(&bars, 1));
    }

    #[test]
    fn engulfing_at_first_bar_is_false() {
        let bars = vec![bar(100.0, 101.0, 99.0, 100.5)];
        assert!(!bullish_engulfing(&bars, 0));
        assert!(!bearish_engulfing(&bars, 0));
    }

    #[test]
    fn detects_bearish_engulfing() {
        let bars = vec![
            bar(100.0, 102.5, 99.8, 102.0), // bullish
            bar(102.3, 102.6, 99.0, 99.5),  // bearish, wraps prior body
        ];
        assert!(bearish_engulfing(&bars, 1));
    }

    #[test]
    fn detects_hammer() {
        // body 0.5, lower wick 2.0, upper wick 0.1
        let b = bar(101.5, 102.1, 99.5, 102.0);
        assert!(hammer(&b));
        assert!(!shooting_star(&b));
    }

    #[test]
    fn detects_shooting_star() {
        // body 0.5, upper wick 2.0, lower wick 0.1
        let b = bar(100.0, 102.5, 99.4, 99.5);
        assert!(shooting_star(&b));
        assert!(!hammer(&b));
    }

    #[test]
    fn doji_is_neither() {
        let b = bar(100.0, 101.0, 99.0, 100.0); // zero body
        assert!(!hammer(&b));
        assert!(!shooting_star(&b));
    }

    #[test]
    fn rejection_helpers() {
        let bars = vec![
            bar(102.0, 102.5, 99.5, 100.0),
            bar(99.8, 103.0, 99.5, 102.5), // bullish engulfing
        ];
        assert!(rejects_low(&bars, 1));
        assert!(!rejects_high(&bars, 1));
    }
}
