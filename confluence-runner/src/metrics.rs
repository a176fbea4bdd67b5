//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. No dependencies on the runner or the data pipeline.

use serde::{Deserialize, Serialize};

use crate::backtest::Trade;
use confluence_core::Bar;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Total return as a fraction of initial equity.
    pub total_return: f64,
    /// Return of holding the instrument over the same window.
    pub buy_and_hold_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Mean net PnL per trade.
    pub expectancy: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[f64], trades: &[Trade], bars: &[Bar]) -> Self {
        Self {
            total_return: total_return(equity_curve),
            buy_and_hold_return: buy_and_hold_return(bars),
            max_drawdown: max_drawdown(equity_curve),
            sharpe: sharpe_ratio(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
            trade_count: trades.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = *equity_curve.last().unwrap();
    if initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Close-to-close return of the bar series itself.
pub fn buy_and_hold_return(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if first.close > 0.0 && bars.len() > 1 => {
            (last.close - first.close) / first.close
        }
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Annualization assumes roughly 6 tradable hours per day over 252 days;
/// on hourly bars that keeps the figure comparable across runs without
/// claiming precision it does not have.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * (252.0_f64 * 6.0).sqrt()
}

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses, capped at 100.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean net PnL per trade.
pub fn expectancy(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.net_pnl).sum::<f64>() / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
