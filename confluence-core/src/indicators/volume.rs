//! Trailing volume average, used for spike and thin-volume detection.

use crate::domain::Bar;
use crate::indicators::sma::sma_of_series;
use crate::indicators::Indicator;

/// Rolling mean of bar volume. Lookback: period - 1.
#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        Self::named(format!("volume_sma_{period}"), period)
    }

    pub fn named(name: impl Into<String>, period: usize) -> Self {
        assert!(period >= 1, "volume SMA period must be >= 1");
        Self {
            period,
            name: name.into(),
        }
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        sma_of_series(&volumes, self.period)
    }
}
