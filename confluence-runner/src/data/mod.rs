//! Data providers and the flat-file bar cache.
//!
//! The `DataProvider` trait abstracts over sources (Yahoo chart API, the
//! CSV cache, seeded synthetic data) so the runner and tests can swap
//! implementations. The cache layer sits above the trait; providers do not
//! know about it.

use chrono::NaiveDate;
use thiserror::Error;

use confluence_core::{Bar, Timeframe};

pub mod cache;
pub mod synthetic;
pub mod yahoo;

pub use cache::BarCache;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

/// What to fetch: one symbol, one interval, one date range.
#[derive(Debug, Clone)]
pub struct DataRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Timeframe,
}

/// Structured errors for data operations, displayable at the CLI.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("no cached data for '{symbol}' ({interval}), run `download {symbol}` first")]
    NoCachedData { symbol: String, interval: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for bar data sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch OHLCV bars for a request, in chronological order.
    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError>;
}

/// Drop bars a strategy evaluation could not use: unparseable rows are the
/// provider's problem, but void bars (NaN prices) and non-positive ranges
/// are filtered here so every downstream consumer sees clean data.
pub fn sanitize(bars: Vec<Bar>) -> Vec<Bar> {
    bars.into_iter().filter(|b| b.is_sane()).collect()
}
