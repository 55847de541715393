//! Per-tick indicator snapshot for one instrument.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::error::IndicatorError;
use trading_core::traits::{Indicator, MultiOutputIndicator};
use trading_core::types::{closes, Bar};

use crate::breakout::BreakoutOutput;
use crate::momentum::Rsi;
use crate::moving_average::Sma;
use crate::volatility::{BollingerBands, DynamicTarget};

/// Indicator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub band_period: usize,
    pub band_std_dev: f64,
    /// Lower-band safety level is `lower * (1 + band_margin)`
    pub band_margin: f64,
    pub dynamic_target: DynamicTarget,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            band_period: 20,
            band_std_dev: 2.0,
            band_margin: 0.005,
            dynamic_target: DynamicTarget::default(),
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.rsi_period == 0 {
            return Err(IndicatorError::InvalidParameter("rsi_period must be > 0".into()));
        }
        if self.band_period < 2 {
            return Err(IndicatorError::InvalidParameter("band_period must be >= 2".into()));
        }
        if !(self.band_std_dev > 0.0) {
            return Err(IndicatorError::InvalidParameter("band_std_dev must be > 0".into()));
        }
        if !(self.band_margin > -1.0) {
            return Err(IndicatorError::InvalidParameter("band_margin must be > -1".into()));
        }
        let t = &self.dynamic_target;
        if !(t.floor > 0.0 && t.floor <= t.cap) {
            return Err(IndicatorError::InvalidParameter(
                "dynamic target needs 0 < floor <= cap".into(),
            ));
        }
        Ok(())
    }
}

/// Derived values for one instrument at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub current_price: Decimal,
    /// `None` when history is too short; never a stand-in number
    pub rsi: Option<f64>,
    /// Middle band
    pub moving_average: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub lower_band_safety: f64,
    /// Volatility-scaled take-profit target, percent
    pub dynamic_target_pct: f64,
    /// Higher-timeframe trend average, when a trend filter is configured
    pub trend_ma: Option<f64>,
    /// Breakout level, when the breakout entry is configured
    pub breakout: Option<BreakoutOutput>,
}

impl IndicatorSnapshot {
    /// Current price as `f64` for comparison against indicator levels.
    pub fn price(&self) -> f64 {
        self.current_price.to_f64().unwrap_or(f64::NAN)
    }

    /// Dynamic target as a fraction, e.g. `0.012` for 1.2%.
    pub fn dynamic_target(&self) -> Decimal {
        Decimal::try_from(self.dynamic_target_pct)
            .map(|pct| (pct / Decimal::ONE_HUNDRED).round_dp(8))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn with_trend(mut self, trend_ma: Option<f64>) -> Self {
        self.trend_ma = trend_ma;
        self
    }

    pub fn with_breakout(mut self, breakout: Option<BreakoutOutput>) -> Self {
        self.breakout = breakout;
        self
    }
}

/// Computes [`IndicatorSnapshot`]s from a candle window. Stateless.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    rsi: Rsi,
    bands: BollingerBands,
    band_margin: f64,
    target: DynamicTarget,
}

impl IndicatorEngine {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            rsi: Rsi::new(config.rsi_period.max(1)),
            bands: BollingerBands::with_params(config.band_period.max(2), config.band_std_dev),
            band_margin: config.band_margin,
            target: config.dynamic_target,
        }
    }

    /// Candles needed for every field to be defined.
    pub fn lookback(&self) -> usize {
        Indicator::period(&self.rsi).max(MultiOutputIndicator::period(&self.bands))
    }

    /// Build the snapshot for `bars` (oldest first) and the live price.
    ///
    /// Fails only when the band window is not full; a short RSI history
    /// leaves `rsi` unset instead.
    pub fn snapshot(
        &self,
        bars: &[Bar],
        current_price: Decimal,
    ) -> Result<IndicatorSnapshot, IndicatorError> {
        let closes = closes(bars);
        let bands = self.bands.require_latest(&closes)?;

        Ok(IndicatorSnapshot {
            current_price,
            rsi: self.rsi.latest(&closes).flatten(),
            moving_average: bands.middle,
            upper_band: bands.upper,
            lower_band: bands.lower,
            lower_band_safety: bands.lower_safety(self.band_margin),
            dynamic_target_pct: self.target.target_pct(bands.bandwidth_pct()),
            trend_ma: None,
            breakout: None,
        })
    }
}

/// Trailing simple average of closes, `None` on short history.
pub fn trend_average(bars: &[Bar], window: usize) -> Option<f64> {
    Sma::new(window.max(1)).latest(&closes(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bars(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::flat(i as i64 * 60_000, p))
            .collect()
    }

    #[test]
    fn test_snapshot_constant_prices() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let snap = engine.snapshot(&bars(&[100.0; 30]), dec!(100)).unwrap();

        assert_eq!(snap.upper_band, 100.0);
        assert_eq!(snap.lower_band, 100.0);
        assert_eq!(snap.dynamic_target_pct, 1.2);
        assert_eq!(snap.dynamic_target(), dec!(0.012));
        // no movement at all: RSI is undefined
        assert_eq!(snap.rsi, None);
        assert!((snap.lower_band_safety - 100.5).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_short_band_window_fails() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let err = engine.snapshot(&bars(&[100.0; 19]), dec!(100)).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                required: 20,
                available: 19
            }
        );
    }

    #[test]
    fn test_snapshot_rsi_unavailable_on_short_history() {
        let config = IndicatorConfig {
            rsi_period: 30,
            ..Default::default()
        };
        let engine = IndicatorEngine::new(&config);
        let rising: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let snap = engine.snapshot(&bars(&rising), dec!(100)).unwrap();
        assert_eq!(snap.rsi, None);
        assert_eq!(engine.lookback(), 31);
    }

    #[test]
    fn test_trend_average() {
        let b = bars(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(trend_average(&b, 2), Some(3.5));
        assert_eq!(trend_average(&b, 5), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());
        let bad = IndicatorConfig {
            band_period: 1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
