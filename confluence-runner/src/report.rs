//! Run reporting: console summary plus JSON and CSV artifacts.

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::backtest::Trade;
use crate::metrics::PerformanceMetrics;
use crate::runner::RunOutcome;

/// JSON artifact for one run; stable shape for downstream tooling.
#[derive(Debug, Serialize)]
pub struct RunArtifact<'a> {
    pub run_id: &'a str,
    pub symbol: &'a str,
    pub metrics: &'a PerformanceMetrics,
    pub signal_count: usize,
    pub veto_counts: &'a BTreeMap<&'static str, usize>,
    pub trades: &'a [Trade],
}

impl<'a> RunArtifact<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        Self {
            run_id: &outcome.run_id,
            symbol: &outcome.config.symbol,
            metrics: &outcome.metrics,
            signal_count: outcome.result.signal_count,
            veto_counts: &outcome.result.veto_counts,
            trades: &outcome.result.trades,
        }
    }
}

/// Human-readable run summary for the console.
pub fn render_summary(outcome: &RunOutcome) -> String {
    let m = &outcome.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "Run {}", &outcome.run_id[..12.min(outcome.run_id.len())]);
    let _ = writeln!(
        out,
        "{} {} from {} to {}",
        outcome.config.symbol, outcome.config.interval, outcome.config.start, outcome.config.end
    );
    let _ = writeln!(out, "  Return         {:>8.2}%", m.total_return * 100.0);
    let _ = writeln!(out, "  Buy & hold     {:>8.2}%", m.buy_and_hold_return * 100.0);
    let _ = writeln!(out, "  Max drawdown   {:>8.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(out, "  Sharpe         {:>8.2}", m.sharpe);
    let _ = writeln!(out, "  Win rate       {:>8.2}%", m.win_rate * 100.0);
    let _ = writeln!(out, "  Profit factor  {:>8.2}", m.profit_factor);
    let _ = writeln!(out, "  Expectancy     {:>8.2}", m.expectancy);
    let _ = writeln!(out, "  Trades         {:>8}", m.trade_count);
    let _ = writeln!(out, "  Signals        {:>8}", outcome.result.signal_count);

    if !outcome.result.veto_counts.is_empty() {
        let _ = writeln!(out, "  Vetoes:");
        for (label, count) in &outcome.result.veto_counts {
            let _ = writeln!(out, "    {label:<16} {count:>6}");
        }
    }
    out
}

/// Write the JSON artifact.
pub fn write_json(path: &Path, outcome: &RunOutcome) -> anyhow::Result<()> {
    let artifact = RunArtifact::from_outcome(outcome);
    let json = serde_json::to_string_pretty(&artifact)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write the trade list as CSV.
pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    for trade in trades {
        writer
            .serialize(trade)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}
