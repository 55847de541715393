//! Volatility indicators.

use serde::{Deserialize, Serialize};
use trading_core::traits::MultiOutputIndicator;

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
}

impl BollingerOutput {
    /// Band width as a percentage of the middle band.
    ///
    /// A zero middle band yields NaN, which [`DynamicTarget`] clamps to its
    /// floor.
    pub fn bandwidth_pct(&self) -> f64 {
        (self.upper - self.lower) / self.middle * 100.0
    }

    /// Entry level slightly above the lower band: `lower * (1 + margin)`.
    pub fn lower_safety(&self, margin: f64) -> f64 {
        self.lower * (1.0 + margin)
    }
}

/// Bollinger Bands.
///
/// Middle band is the SMA of the window; the bands sit a multiple of the
/// window's *sample* standard deviation (n - 1 divisor) away.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }

    fn bands(&self, window: &[f64]) -> BollingerOutput {
        let n = window.len() as f64;
        let mean: f64 = window.iter().sum::<f64>() / n;
        let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let width = self.std_dev_multiplier * variance.sqrt();

        BollingerOutput {
            upper: mean + width,
            middle: mean,
            lower: mean - width,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }
        data.windows(self.period).map(|w| self.bands(w)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn latest(&self, data: &[f64]) -> Option<BollingerOutput> {
        if data.len() < self.period {
            return None;
        }
        Some(self.bands(&data[data.len() - self.period..]))
    }
}

/// Take-profit target scaled to recent volatility.
///
/// `target = clamp(bandwidth_pct * scale, floor, cap)`, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicTarget {
    pub scale: f64,
    pub floor: f64,
    pub cap: f64,
}

impl Default for DynamicTarget {
    fn default() -> Self {
        Self {
            scale: 0.7,
            floor: 1.2,
            cap: 3.5,
        }
    }
}

impl DynamicTarget {
    /// Target return in percent for the given band width.
    ///
    /// NaN maps to the floor and infinities to the matching bound, so the
    /// result is always inside `[floor, cap]`.
    pub fn target_pct(&self, bandwidth_pct: f64) -> f64 {
        let scaled = bandwidth_pct * self.scale;
        if scaled.is_nan() {
            return self.floor;
        }
        scaled.clamp(self.floor, self.cap)
    }
}
