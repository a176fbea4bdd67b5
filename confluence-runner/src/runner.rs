//! Run orchestration: data loading, the backtest call, and metric rollup.

use anyhow::Context;

use crate::backtest::{self, BacktestResult};
use crate::config::{RunConfig, RunId};
use crate::data::{
    sanitize, BarCache, DataProvider, DataRequest, SyntheticProvider, YahooProvider,
};
use crate::metrics::PerformanceMetrics;
use confluence_core::Bar;

/// Where a run's bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Cache only; fail if the symbol has not been downloaded.
    Offline,
    /// Fetch from the network, refresh the cache, then run.
    Network,
    /// Seeded generator, no I/O.
    Synthetic { seed: u64 },
}

/// A completed run with its provenance.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub config: RunConfig,
    pub result: BacktestResult,
    pub metrics: PerformanceMetrics,
}

/// Load bars for a config according to the data mode.
pub fn load_bars(config: &RunConfig, mode: DataMode) -> anyhow::Result<Vec<Bar>> {
    let request = DataRequest {
        symbol: config.symbol.clone(),
        start: config.start,
        end: config.end,
        interval: config.interval,
    };
    let cache = BarCache::new(&config.cache_dir);

    let bars = match mode {
        DataMode::Offline => cache
            .load(&config.symbol, config.interval)
            .with_context(|| format!("loading cached bars for {}", config.symbol))?,
        DataMode::Network => {
            let provider = YahooProvider::new();
            let bars = provider
                .fetch(&request)
                .with_context(|| format!("fetching {}", config.symbol))?;
            cache
                .store(&config.symbol, config.interval, &bars)
                .with_context(|| format!("caching bars for {}", config.symbol))?;
            bars
        }
        DataMode::Synthetic { seed } => SyntheticProvider::new(seed)
            .fetch(&request)
            .expect("synthetic provider is infallible"),
    };

    Ok(sanitize(bars))
}

/// Execute one backtest over already-loaded bars.
pub fn run_backtest(config: &RunConfig, bars: &[Bar]) -> anyhow::Result<RunOutcome> {
    config.validate()?;
    anyhow::ensure!(!bars.is_empty(), "no bars to run over");

    let result = backtest::run(bars, &config.strategy, &config.params);
    let metrics = PerformanceMetrics::compute(&result.equity_curve, &result.trades, bars);

    Ok(RunOutcome {
        run_id: config.run_id(),
        config: config.clone(),
        result,
        metrics,
    })
}
