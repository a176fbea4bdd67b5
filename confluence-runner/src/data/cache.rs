//! Flat-file CSV bar cache.
//!
//! One file per symbol and interval under the cache directory. This is the
//! only persistence in the system: downloads land here, offline runs read
//! from here, nothing else is stored.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use confluence_core::{Bar, Timeframe};

use super::DataError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// On-disk row; timestamps are ISO-8601 without offset.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub struct BarCache {
    dir: PathBuf,
}

impl BarCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path for a symbol/interval pair. Symbols can contain characters that
    /// are awkward in filenames (e.g. `EURUSD=X`); those are mapped to `-`.
    pub fn path_for(&self, symbol: &str, interval: Timeframe) -> PathBuf {
        let safe: String = symbol
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        self.dir.join(format!("{safe}_{interval}.csv"))
    }

    pub fn has(&self, symbol: &str, interval: Timeframe) -> bool {
        self.path_for(symbol, interval).exists()
    }

    /// Write bars for a symbol, replacing any existing file.
    pub fn store(&self, symbol: &str, interval: Timeframe, bars: &[Bar]) -> Result<(), DataError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::CacheError(format!("create {}: {e}", self.dir.display())))?;

        let path = self.path_for(symbol, interval);
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| DataError::CacheError(format!("open {}: {e}", path.display())))?;

        for bar in bars {
            let row = CacheRow {
                timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            };
            writer
                .serialize(row)
                .map_err(|e| DataError::CacheError(format!("write {}: {e}", path.display())))?;
        }
        writer
            .flush()
            .map_err(|e| DataError::CacheError(format!("flush {}: {e}", path.display())))?;
        Ok(())
    }

    /// Load all cached bars for a symbol, in file order.
    pub fn load(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
            });
        }
        read_bars(&path, symbol)
    }
}

fn read_bars(path: &Path, symbol: &str) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::CacheError(format!("open {}: {e}", path.display())))?;

    let mut bars = Vec::new();
    for row in reader.deserialize::<CacheRow>() {
        let row = row.map_err(|e| DataError::CacheError(format!("read {}: {e}", path.display())))?;
        let timestamp = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| DataError::CacheError(format!("bad timestamp '{}': {e}", row.timestamp)))?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}
