//! Parameter sweep: grid search over the strategy's headline tunables.
//!
//! The grid mirrors the parameters worth trading off against each other:
//! quality floor, risk:reward floor, and the final target multiple. Runs
//! fan out across a rayon pool; one run per combination.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backtest;
use crate::config::RunConfig;
use crate::metrics::PerformanceMetrics;
use confluence_core::Bar;

/// Grid specification; the cartesian product is swept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepGrid {
    pub min_quality: Vec<f64>,
    pub min_risk_reward: Vec<f64>,
    pub tp2_atr: Vec<f64>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            min_quality: vec![50.0, 60.0, 70.0],
            min_risk_reward: vec![1.5, 2.0, 2.5],
            tp2_atr: vec![3.0, 4.0, 5.0],
        }
    }
}

impl SweepGrid {
    pub fn size(&self) -> usize {
        self.min_quality.len() * self.min_risk_reward.len() * self.tp2_atr.len()
    }

    fn combinations(&self) -> Vec<(f64, f64, f64)> {
        let mut out = Vec::with_capacity(self.size());
        for &quality in &self.min_quality {
            for &rr in &self.min_risk_reward {
                for &tp2 in &self.tp2_atr {
                    out.push((quality, rr, tp2));
                }
            }
        }
        out
    }
}

/// One grid point's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRow {
    pub min_quality: f64,
    pub min_risk_reward: f64,
    pub tp2_atr: f64,
    pub metrics: PerformanceMetrics,
}

/// Sweep the grid over one bar series. Rows come back sorted by total
/// return, best first; combinations that fail validation are skipped.
pub fn run_grid(bars: &[Bar], base: &RunConfig, grid: &SweepGrid) -> Vec<SweepRow> {
    let mut rows: Vec<SweepRow> = grid
        .combinations()
        .into_par_iter()
        .filter_map(|(quality, rr, tp2)| {
            let mut config = base.clone();
            config.strategy.min_quality = quality;
            config.strategy.min_risk_reward = rr;
            config.strategy.tp2_atr = tp2;
            config.strategy.validate().ok()?;

            let result = backtest::run(bars, &config.strategy, &config.params);
            let metrics = PerformanceMetrics::compute(&result.equity_curve, &result.trades, bars);
            Some(SweepRow {
                min_quality: quality,
                min_risk_reward: rr,
                tp2_atr: tp2,
                metrics,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.metrics
            .total_return
            .partial_cmp(&a.metrics.total_return)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Console table for sweep results.
pub fn render_table(rows: &[SweepRow]) -> String {
    let mut out = String::from(
        "  quality     rr    tp2   return%     dd%   trades  win%\n",
    );
    for row in rows {
        let m = &row.metrics;
        out.push_str(&format!(
            "  {:>7.0} {:>6.1} {:>6.1} {:>9.2} {:>7.2} {:>8} {:>5.1}\n",
            row.min_quality,
            row.min_risk_reward,
            row.tp2_atr,
            m.total_return * 100.0,
            m.max_drawdown * 100.0,
            m.trade_count,
            m.win_rate * 100.0,
        ));
    }
    out
}
