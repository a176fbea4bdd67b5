//! Confluence Core — domain types, indicators, and the per-bar signal pipeline.
//!
//! This crate contains the strategy engine shared by the scan surface and
//! the backtest runner:
//! - Domain types (bars, signals, key levels, market states)
//! - Indicator trait and the precomputed indicator set
//! - Higher-timeframe resampling with a non-repainting accessor
//! - Key level derivation and candlestick pattern detection
//! - The evaluation pipeline: gate → volatility → bias → regime →
//!   trend/range setup → risk plan → quality score → no-trade overlay
//! - Alert condition matching and payload formatting

pub mod alerts;
pub mod candles;
pub mod config;
pub mod domain;
pub mod htf;
pub mod indicators;
pub mod levels;
pub mod pipeline;

pub use config::{ConfigError, StrategyConfig};
pub use domain::{Bar, Bias, Direction, Regime, Session, Signal, VolState};
pub use htf::{HtfContext, Timeframe};
pub use pipeline::{evaluate, evaluate_opt, MarketInfo, Veto};
