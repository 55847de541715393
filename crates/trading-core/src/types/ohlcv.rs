//! OHLCV (Open, High, Low, Close, Volume) price bars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One candle of one instrument.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Candle open time, Unix milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing (or latest traded) price
    pub close: f64,
    /// Traded volume in base currency
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a flat bar where every price equals `price`.
    pub fn flat(timestamp: i64, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Get the timestamp as a DateTime, if it is representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Whether every price field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Extract close prices, oldest first.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_range() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1000000.0);
        assert!((bar.range() - 15.0).abs() < 0.001);
        assert!(bar.is_finite());
    }

    #[test]
    fn test_flat_bar() {
        let bar = Bar::flat(0, 42.0);
        assert_eq!(bar.range(), 0.0);
        assert_eq!(bar.close, 42.0);
    }

    #[test]
    fn test_non_finite_bar() {
        let bar = Bar::new(0, 1.0, f64::NAN, 1.0, 1.0, 0.0);
        assert!(!bar.is_finite());
    }

    #[test]
    fn test_closes_extraction() {
        let bars = vec![
            Bar::new(1, 100.0, 101.0, 99.0, 100.5, 1000.0),
            Bar::new(2, 100.5, 102.0, 100.0, 101.5, 2000.0),
        ];
        assert_eq!(closes(&bars), vec![100.5, 101.5]);
    }
}
