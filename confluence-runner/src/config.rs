//! Serializable run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backtest::BacktestParams;
use confluence_core::{StrategyConfig, Timeframe};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Everything needed to reproduce a run: instrument, window, execution
/// assumptions, and the full strategy parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Timeframe,
    pub cache_dir: PathBuf,
    pub params: BacktestParams,
    pub strategy: StrategyConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD=X".into(),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            interval: Timeframe::H1,
            cache_dir: PathBuf::from("data/cache"),
            params: BacktestParams::default(),
            strategy: StrategyConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent settings before any work starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.start >= self.end {
            anyhow::bail!("start date {} is not before end date {}", self.start, self.end);
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Deterministic content hash: identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
