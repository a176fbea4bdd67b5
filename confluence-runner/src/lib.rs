//! Confluence Runner — data pipeline, backtest loop, metrics, and sweeps.
//!
//! This crate wraps the core strategy in everything a historical run needs:
//! - Data providers (Yahoo chart API, seeded synthetic) and the CSV cache
//! - The single-position backtest loop with conservative intrabar fills
//! - Pure-function performance metrics
//! - Reproducible run configuration with content-addressed run IDs
//! - Console/JSON/CSV reporting and a rayon-parallel parameter sweep

pub mod backtest;
pub mod config;
pub mod data;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sweep;

pub use backtest::{BacktestParams, BacktestResult, ExitReason, Trade};
pub use config::{RunConfig, RunId};
pub use metrics::PerformanceMetrics;
pub use runner::{load_bars, run_backtest, DataMode, RunOutcome};
