//! Higher-timeframe context.
//!
//! Execution-timeframe bars are resampled into higher-timeframe buckets;
//! EMA50/EMA200 and ADX are computed on the resampled series. The accessor
//! only ever exposes the most recently *closed* higher-timeframe bar: the
//! bucket containing the execution bar is excluded, so a forming bar can
//! never leak into the evaluation (non-repainting constraint).

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Bar;
use crate::indicators::{Adx, Ema, Indicator};

/// Bar interval / higher-timeframe choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1wk")]
    W1,
}

impl Timeframe {
    /// The start of the bucket containing `ts`.
    pub fn bucket_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let day = ts.date().and_hms_opt(0, 0, 0).expect("midnight is valid");
        match self {
            Timeframe::M15 => day
                + Duration::hours(ts.hour() as i64)
                + Duration::minutes((ts.minute() / 15 * 15) as i64),
            Timeframe::H1 => day + Duration::hours(ts.hour() as i64),
            Timeframe::H4 => day + Duration::hours((ts.hour() / 4 * 4) as i64),
            Timeframe::D1 => day,
            Timeframe::W1 => {
                // ISO week: Monday 00:00
                let days_from_monday = ts.weekday().num_days_from_monday() as i64;
                day - Duration::days(days_from_monday)
            }
        }
    }

    /// Interval string in Yahoo chart API vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1wk",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15m" => Ok(Timeframe::M15),
            "1h" | "60m" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            "1wk" | "1w" => Ok(Timeframe::W1),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// Values read from the last closed higher-timeframe bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HtfSnapshot {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub adx: f64,
}

impl HtfSnapshot {
    pub fn is_valid(&self) -> bool {
        !self.ema_fast.is_nan() && !self.ema_slow.is_nan() && !self.adx.is_nan()
    }
}

/// Precomputed higher-timeframe series plus the per-execution-bar mapping
/// to the last closed higher-timeframe index.
#[derive(Debug, Clone)]
pub struct HtfContext {
    ema_fast: Vec<f64>,
    ema_slow: Vec<f64>,
    adx: Vec<f64>,
    /// For each execution bar, index of the last closed HTF bar (if any).
    last_closed: Vec<Option<usize>>,
}

impl HtfContext {
    /// Resample execution bars to `timeframe` and compute the bias series.
    ///
    /// `adx_period` is the ADX period applied on the resampled bars; EMA
    /// periods are the conventional 50/200.
    pub fn build(bars: &[Bar], timeframe: Timeframe, adx_period: usize) -> Self {
        let htf_bars = resample(bars, timeframe);

        let ema_fast = Ema::new(50).compute(&htf_bars);
        let ema_slow = Ema::new(200).compute(&htf_bars);
        let adx = Adx::new(adx_period).compute(&htf_bars);

        // Map each execution bar to the last HTF bar whose bucket precedes
        // the execution bar's bucket. The containing bucket is still forming.
        let mut last_closed = Vec::with_capacity(bars.len());
        let mut htf_idx = 0usize;
        for bar in bars {
            let bucket = timeframe.bucket_start(bar.timestamp);
            while htf_idx < htf_bars.len() && htf_bars[htf_idx].timestamp < bucket {
                htf_idx += 1;
            }
            last_closed.push(htf_idx.checked_sub(1));
        }

        Self {
            ema_fast,
            ema_slow,
            adx,
            last_closed,
        }
    }

    /// Construct from externally supplied series (a charting host that
    /// provides its own higher-timeframe request can inject values here).
    ///
    /// All four vectors are indexed the same way `build` indexes them:
    /// the series by HTF bar, `last_closed` by execution bar.
    pub fn from_series(
        ema_fast: Vec<f64>,
        ema_slow: Vec<f64>,
        adx: Vec<f64>,
        last_closed: Vec<Option<usize>>,
    ) -> Self {
        Self {
            ema_fast,
            ema_slow,
            adx,
            last_closed,
        }
    }

    /// Snapshot of the last closed HTF bar for an execution bar index.
    ///
    /// Returns `None` when no HTF bar has closed yet or any series is still
    /// in warmup at that point.
    pub fn at(&self, bar_index: usize) -> Option<HtfSnapshot> {
        let htf_index = (*self.last_closed.get(bar_index)?)?;
        let snapshot = HtfSnapshot {
            ema_fast: *self.ema_fast.get(htf_index)?,
            ema_slow: *self.ema_slow.get(htf_index)?,
            adx: *self.adx.get(htf_index)?,
        };
        Some(snapshot)
    }
}

/// Aggregate execution bars into higher-timeframe bars.
///
/// Bars are assumed chronological. Each output bar carries the bucket start
/// as its timestamp; open/close are first/last, high/low are extremes,
/// volume is summed.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();

    for bar in bars {
        let bucket = timeframe.bucket_start(bar.timestamp);
        match out.last_mut() {
            Some(last) if last.timestamp == bucket => {
                last.high = last.high.max(bar.high);
                last.low = last.low.min(bar.low);
                last.close = bar.close;
                last.volume += bar.volume;
            }
            _ => {
                let mut htf_bar = bar.clone();
                htf_bar.timestamp = bucket;
                out.push(htf_bar);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hourly_bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1) // a Monday
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    symbol: "TEST".into(),
                    timestamp: base + Duration::hours(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.5,
                    close,
                    volume: 10,
                }
            })
            .collect()
    }

    #[test]
    fn bucket_start_h4() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let bucket = Timeframe::H4.bucket_start(ts);
        assert_eq!(bucket.hour(), 12);
        assert_eq!(bucket.minute(), 0);
    }

    #[test]
    fn bucket_start_w1_is_monday() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 4) // a Thursday
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let bucket = Timeframe::W1.bucket_start(ts);
        assert_eq!(bucket.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn resample_hourly_to_h4() {
        let bars = hourly_bars(8);
        let htf = resample(&bars, Timeframe::H4);
        assert_eq!(htf.len(), 2);
        // First bucket: bars 0..4
        assert_eq!(htf[0].open, bars[0].open);
        assert_eq!(htf[0].close, bars[3].close);
        assert_eq!(htf[0].high, bars[3].high);
        assert_eq!(htf[0].low, bars[0].low);
        assert_eq!(htf[0].volume, 40);
    }

    #[test]
    fn last_closed_excludes_forming_bucket() {
        let bars = hourly_bars(9); // buckets: [0..4), [4..8), [8..9)
        let ctx = HtfContext::build(&bars, Timeframe::H4, 3);

        // Bars 0-3 sit in the first bucket: nothing has closed yet.
        for i in 0..4 {
            assert!(ctx.at(i).is_none(), "bar {i} should have no closed HTF bar");
        }
        // Bars 4-7: only the first bucket has closed (index 0). The series
        // are still in EMA warmup, so at() stays None, but the mapping must
        // not point at the forming bucket.
        assert_eq!(ctx.last_closed[4], Some(0));
        assert_eq!(ctx.last_closed[8], Some(1));
    }

    #[test]
    fn from_series_snapshot() {
        let ctx = HtfContext::from_series(
            vec![101.0, 102.0],
            vec![100.0, 100.5],
            vec![25.0, 26.0],
            vec![None, Some(0), Some(1)],
        );
        assert!(ctx.at(0).is_none());
        let snap = ctx.at(1).unwrap();
        assert_eq!(snap.ema_fast, 101.0);
        assert_eq!(snap.adx, 25.0);
        let snap = ctx.at(2).unwrap();
        assert_eq!(snap.ema_slow, 100.5);
        assert!(ctx.at(3).is_none());
    }

    #[test]
    fn snapshot_validity() {
        let valid = HtfSnapshot {
            ema_fast: 1.0,
            ema_slow: 2.0,
            adx: 20.0,
        };
        assert!(valid.is_valid());
        let invalid = HtfSnapshot {
            ema_fast: f64::NAN,
            ..valid
        };
        assert!(!invalid.is_valid());
    }

    #[test]
    fn timeframe_parse_roundtrip() {
        for tf in [
            Timeframe::M15,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
            Timeframe::W1,
        ] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("3m".parse::<Timeframe>().is_err());
    }
}
