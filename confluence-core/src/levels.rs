//! Key level computation.
//!
//! Levels are recomputed per bar from *completed* prior bars only: the
//! prior day's and prior week's extremes, the current session open, classic
//! floor pivots from the prior day's HLC, and the nearest psychological
//! round number. Read-only references for distance and quality checks.

use chrono::{Datelike, NaiveDate};

use crate::domain::{Bar, KeyLevel, LevelKind};

/// Aggregated OHLC of one completed calendar period.
#[derive(Debug, Clone, Copy)]
struct PeriodExtremes {
    high: f64,
    low: f64,
    close: f64,
}

/// Compute all key levels visible from `bars[index]`.
///
/// Levels that cannot be derived yet (e.g., no completed prior day in the
/// window) are simply omitted; the pipeline treats an empty set as
/// "no level nearby".
pub fn key_levels(bars: &[Bar], index: usize) -> Vec<KeyLevel> {
    let mut levels = Vec::new();
    let Some(current) = bars.get(index) else {
        return levels;
    };

    let today = current.timestamp.date();
    let this_week = week_key(today);

    if let Some(open) = session_open(bars, index, today) {
        levels.push(KeyLevel::new(LevelKind::SessionOpen, open));
    }

    if let Some(prior_day) = prior_date(bars, index, today) {
        if let Some(day) = aggregate_period(bars, index, |d| d.cmp(&prior_day)) {
            levels.push(KeyLevel::new(LevelKind::PriorDayHigh, day.high));
            levels.push(KeyLevel::new(LevelKind::PriorDayLow, day.low));

            // Floor pivots from prior-day HLC.
            let pivot = (day.high + day.low + day.close) / 3.0;
            levels.push(KeyLevel::new(LevelKind::Pivot, pivot));
            levels.push(KeyLevel::new(LevelKind::PivotR1, 2.0 * pivot - day.low));
            levels.push(KeyLevel::new(LevelKind::PivotS1, 2.0 * pivot - day.high));
        }
    }

    if let Some(prior_week) = prior_week_key(bars, index, this_week) {
        if let Some(week) = aggregate_period(bars, index, |d| week_key(d).cmp(&prior_week)) {
            levels.push(KeyLevel::new(LevelKind::PriorWeekHigh, week.high));
            levels.push(KeyLevel::new(LevelKind::PriorWeekLow, week.low));
        }
    }

    if let Some(round) = nearest_round(current.close) {
        levels.push(KeyLevel::new(LevelKind::RoundNumber, round));
    }

    levels
}

/// Open of the first bar of the current date.
fn session_open(bars: &[Bar], index: usize, today: NaiveDate) -> Option<f64> {
    let first = bars[..=index]
        .iter()
        .rposition(|b| b.timestamp.date() != today)
        .map(|i| i + 1)
        .unwrap_or(0);
    let bar = &bars[first];
    (bar.timestamp.date() == today && !bar.open.is_nan()).then_some(bar.open)
}

/// Most recent completed date strictly before `today` in the window.
fn prior_date(bars: &[Bar], index: usize, today: NaiveDate) -> Option<NaiveDate> {
    bars[..=index]
        .iter()
        .rev()
        .map(|b| b.timestamp.date())
        .find(|&d| d < today)
}

/// (iso year, iso week) sortable key.
fn week_key(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// Week key of the most recent completed week strictly before `this_week`.
fn prior_week_key(bars: &[Bar], index: usize, this_week: (i32, u32)) -> Option<(i32, u32)> {
    bars[..=index]
        .iter()
        .rev()
        .map(|b| week_key(b.timestamp.date()))
        .find(|&k| k < this_week)
}

/// Aggregate high/low/close over the bars of one completed period.
///
/// `cmp` orders a bar's date against the target period; the reverse scan
/// stops as soon as it walks past the period's first bar.
fn aggregate_period(
    bars: &[Bar],
    index: usize,
    cmp: impl Fn(NaiveDate) -> std::cmp::Ordering,
) -> Option<PeriodExtremes> {
    use std::cmp::Ordering;

    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    let mut close = f64::NAN;

    for bar in bars[..=index].iter().rev() {
        match cmp(bar.timestamp.date()) {
            Ordering::Greater => continue,
            Ordering::Less => break, // walked past the period; bars are chronological
            Ordering::Equal => {
                if bar.is_void() {
                    continue;
                }
                high = high.max(bar.high);
                low = low.min(bar.low);
                if close.is_nan() {
                    close = bar.close; // first hit scanning backwards = period close
                }
            }
        }
    }

    (high.is_finite() && low.is_finite()).then_some(PeriodExtremes { high, low, close })
}

/// Nearest psychological round number: the price grid one order of
/// magnitude below the price's own (e.g., 24,512 → 1,000 grid → 25,000;
/// 105.2 → 10 grid → 110; 1.2734 → 0.1 grid → 1.3).
pub fn nearest_round(price: f64) -> Option<f64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let grid = 10f64.powi(price.log10().floor() as i32 - 1);
    Some((price / grid).round() * grid)
}

/// Nearest key level to a price, if any.
pub fn nearest_level(levels: &[KeyLevel], price: f64) -> Option<KeyLevel> {
    levels
        .iter()
        .min_by(|a, b| {
            a.distance(price)
                .partial_cmp(&b.distance(price))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
}
