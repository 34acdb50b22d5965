use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True range against the previous close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        self.total_range()
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }

    fn check(&self) -> Result<(), &'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err("prices must be positive and finite");
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err("high below open/close/low");
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err("low above open/close/high");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err("volume must be non-negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("timestamp at index {index} is not after the previous bar")]
    NonMonotonicTimestamp { index: usize },
}

/// Chronologically ordered bars for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Wraps bars as delivered by the data source, without validation.
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    /// Wraps bars after checking OHLC consistency and strictly increasing
    /// timestamps.
    pub fn try_new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.check()
                .map_err(|reason| SeriesError::InvalidBar { index, reason })?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(SeriesError::NonMonotonicTimestamp { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn head(&self, n: usize) -> BarSeries {
        let end = n.min(self.bars.len());
        BarSeries::new(self.bars[..end].to_vec())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    /// Index of the bar with exactly this timestamp.
    pub fn index_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.timestamp < ts);
        match self.bars.get(idx) {
            Some(b) if b.timestamp == ts => Some(idx),
            _ => None,
        }
    }
}

impl std::ops::Index<usize> for BarSeries {
    type Output = Bar;
    fn index(&self, index: usize) -> &Self::Output {
        &self.bars[index]
    }
}

impl IntoIterator for BarSeries {
    type Item = Bar;
    type IntoIter = std::vec::IntoIter<Bar>;
    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;
    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
