//! Confluence CLI — download, run, scan, and sweep commands.
//!
//! Commands:
//! - `download` — fetch hourly bars from Yahoo Finance and cache as CSV
//! - `run` — backtest from a TOML config file or a bare symbol
//! - `scan` — evaluate the latest closed bar and print any alert
//! - `sweep` — grid search over quality/risk/target parameters

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use confluence_core::indicators::{precompute, warmup_bars};
use confluence_core::pipeline::{evaluate, MarketInfo};
use confluence_core::{alerts, HtfContext, Timeframe};
use confluence_runner::data::{BarCache, DataProvider, DataRequest, YahooProvider};
use confluence_runner::sweep::{run_grid, render_table, SweepGrid};
use confluence_runner::{load_bars, report, run_backtest, DataMode, RunConfig};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI — multi-filter signal engine and backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download bars from Yahoo Finance and cache them as CSV.
    Download {
        /// Symbols to download (e.g., EURUSD=X GBPUSD=X).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Bar interval: 15m, 1h, 4h, 1d, 1wk.
        #[arg(long, default_value = "1h")]
        interval: Timeframe,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
    /// Run a backtest from a TOML config file or a bare symbol.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol to run with default parameters (alternative to --config).
        #[arg(long)]
        symbol: Option<String>,

        /// Start date (YYYY-MM-DD), with --symbol.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), with --symbol.
        #[arg(long)]
        end: Option<String>,

        /// Offline mode: cache only, no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use seeded synthetic data instead of real bars.
        #[arg(long)]
        synthetic: Option<u64>,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Output directory for run artifacts (JSON + trades CSV).
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evaluate the latest closed bar and print any alert payloads.
    Scan {
        /// Symbol to scan.
        #[arg(long)]
        symbol: String,

        /// Offline mode: cache only, no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
    /// Grid search over quality, risk:reward, and target parameters.
    Sweep {
        /// Path to a TOML config file for the base parameters.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol to sweep with default base parameters.
        #[arg(long)]
        symbol: Option<String>,

        /// Offline mode: cache only, no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use seeded synthetic data instead of real bars.
        #[arg(long)]
        synthetic: Option<u64>,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            symbols,
            start,
            end,
            interval,
            force,
            cache_dir,
        } => run_download(symbols, start, end, interval, force, cache_dir),
        Commands::Run {
            config,
            symbol,
            start,
            end,
            offline,
            synthetic,
            cache_dir,
            output_dir,
        } => run_backtest_cmd(
            config, symbol, start, end, offline, synthetic, cache_dir, output_dir,
        ),
        Commands::Scan {
            symbol,
            offline,
            cache_dir,
        } => run_scan(symbol, offline, cache_dir),
        Commands::Sweep {
            config,
            symbol,
            offline,
            synthetic,
            cache_dir,
        } => run_sweep(config, symbol, offline, synthetic, cache_dir),
    }
}

fn parse_date(text: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate> {
    match text {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(fallback),
    }
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    interval: Timeframe,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start = parse_date(start.as_deref(), today - chrono::Duration::days(365))?;
    let end = parse_date(end.as_deref(), today)?;

    let provider = YahooProvider::new();
    let cache = BarCache::new(&cache_dir);
    let mut failures = 0usize;

    for symbol in &symbols {
        if !force && cache.has(symbol, interval) {
            println!("{symbol}: cached, skipping (--force to refresh)");
            continue;
        }

        let request = DataRequest {
            symbol: symbol.clone(),
            start,
            end,
            interval,
        };
        match provider.fetch(&request) {
            Ok(bars) => {
                cache
                    .store(symbol, interval, &bars)
                    .with_context(|| format!("caching {symbol}"))?;
                println!("{symbol}: {} bars", bars.len());
            }
            Err(err) => {
                eprintln!("{symbol}: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} downloads failed", symbols.len());
    }
    Ok(())
}

/// Build a RunConfig from either a config file or command-line pieces.
fn resolve_config(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    cache_dir: PathBuf,
) -> Result<RunConfig> {
    if config_path.is_some() && symbol.is_some() {
        bail!("--config and --symbol are mutually exclusive");
    }

    let mut config = match config_path {
        Some(path) => RunConfig::load(&path)?,
        None => {
            let mut config = RunConfig::default();
            if let Some(sym) = symbol {
                config.symbol = sym;
            }
            config.start = parse_date(start.as_deref(), config.start)?;
            config.end = parse_date(end.as_deref(), config.end)?;
            config
        }
    };
    config.cache_dir = cache_dir;
    config.validate()?;
    Ok(config)
}

fn data_mode(offline: bool, synthetic: Option<u64>) -> Result<DataMode> {
    match (offline, synthetic) {
        (true, Some(_)) => bail!("--offline and --synthetic are mutually exclusive"),
        (_, Some(seed)) => Ok(DataMode::Synthetic { seed }),
        (true, None) => Ok(DataMode::Offline),
        (false, None) => Ok(DataMode::Network),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    offline: bool,
    synthetic: Option<u64>,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    let config = resolve_config(config_path, symbol, start, end, cache_dir)?;
    let mode = data_mode(offline, synthetic)?;

    let bars = load_bars(&config, mode)?;
    let outcome = run_backtest(&config, &bars)?;

    print!("{}", report::render_summary(&outcome));
    if matches!(mode, DataMode::Synthetic { .. }) {
        println!("WARNING: results based on synthetic data");
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let short_id = &outcome.run_id[..12.min(outcome.run_id.len())];
    let json_path = output_dir.join(format!("{short_id}.json"));
    let csv_path = output_dir.join(format!("{short_id}_trades.csv"));
    report::write_json(&json_path, &outcome)?;
    report::write_trades_csv(&csv_path, &outcome.result.trades)?;
    println!("Artifacts: {} / {}", json_path.display(), csv_path.display());

    Ok(())
}

/// Scan configuration: one year of history ending today, so the newest
/// fetched bar is the current closed one rather than a stale default range.
fn scan_config(symbol: String, cache_dir: PathBuf, today: NaiveDate) -> RunConfig {
    let mut config = RunConfig::default();
    config.symbol = symbol;
    config.cache_dir = cache_dir;
    config.end = today;
    config.start = today - chrono::Duration::days(365);
    config
}

fn run_scan(symbol: String, offline: bool, cache_dir: PathBuf) -> Result<()> {
    let config = scan_config(symbol, cache_dir, chrono::Local::now().date_naive());

    let mode = if offline { DataMode::Offline } else { DataMode::Network };
    let bars = load_bars(&config, mode)?;
    anyhow::ensure!(
        bars.len() > warmup_bars(&config.strategy),
        "not enough history for {}: {} bars",
        config.symbol,
        bars.len()
    );

    let indicators = precompute(&bars, &config.strategy);
    let htf = HtfContext::build(
        &bars,
        config.strategy.higher_timeframe,
        config.strategy.adx_period,
    );
    let market = MarketInfo {
        symbol: &config.symbol,
        spread: config.params.spread,
    };

    let index = bars.len() - 1;
    let bar = &bars[index];
    println!("{} last closed bar: {} close {:.4}", config.symbol, bar.timestamp, bar.close);

    match evaluate(&bars, index, &indicators, &htf, &market, &config.strategy) {
        Ok(signal) => {
            for (kind, payload) in alerts::fired(&signal) {
                println!("[{kind}] {payload}");
            }
        }
        Err(veto) => println!("no signal: {veto}"),
    }
    Ok(())
}

fn run_sweep(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    offline: bool,
    synthetic: Option<u64>,
    cache_dir: PathBuf,
) -> Result<()> {
    let config = resolve_config(config_path, symbol, None, None, cache_dir)?;
    let mode = data_mode(offline, synthetic)?;
    let bars = load_bars(&config, mode)?;

    let grid = SweepGrid::default();
    println!(
        "Sweeping {} combinations over {} bars of {}",
        grid.size(),
        bars.len(),
        config.symbol
    );
    let rows = run_grid(&bars, &config, &grid);
    print!("{}", render_table(&rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_window_ends_today_not_at_the_default_range() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let config = scan_config("EURUSD=X".into(), PathBuf::from("data/cache"), today);
        assert_eq!(config.end, today);
        assert_eq!(config.start, today - chrono::Duration::days(365));
        assert_ne!(config.end, RunConfig::default().end);
        config.validate().unwrap();
    }

    #[test]
    fn offline_and_synthetic_are_mutually_exclusive() {
        assert!(data_mode(true, Some(1)).is_err());
        assert_eq!(data_mode(false, None).unwrap(), DataMode::Network);
        assert_eq!(
            data_mode(false, Some(7)).unwrap(),
            DataMode::Synthetic { seed: 7 }
        );
    }
}
