//! Market regime classification from a reference instrument.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trading_core::traits::{Indicator, MarketData};
use trading_core::types::{closes, CandleInterval, Instrument, MarketRegime};
use trading_indicators::Sma;

/// Reference market and moving-average window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub reference: Instrument,
    pub interval: CandleInterval,
    pub window: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            reference: Instrument::new("KRW", "BTC"),
            interval: CandleInterval::Day,
            window: 5,
        }
    }
}

/// Labels the market `Up` when the reference price sits above its short
/// moving average. Anything it cannot determine is `DownOrSideways`.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    pub fn reference(&self) -> &Instrument {
        &self.config.reference
    }

    /// Pure rule over recent closes and the live price.
    pub fn classify(&self, closes: &[f64], price: Decimal) -> MarketRegime {
        let Some(average) = Sma::new(self.config.window.max(1)).latest(closes) else {
            return MarketRegime::DownOrSideways;
        };
        match price.to_f64() {
            Some(p) if p.is_finite() && average.is_finite() && p > average => MarketRegime::Up,
            _ => MarketRegime::DownOrSideways,
        }
    }

    /// Fetch reference data and classify; any failure is `DownOrSideways`.
    pub async fn evaluate<M>(&self, market: &M) -> MarketRegime
    where
        M: MarketData + ?Sized,
    {
        let reference = &self.config.reference;
        let bars = match market
            .candles(reference, self.config.interval, self.config.window)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                warn!(instrument = %reference, error = %e, "Regime candles unavailable");
                return MarketRegime::DownOrSideways;
            }
        };
        let price = match market.current_price(reference).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                warn!(instrument = %reference, "Regime price unavailable");
                return MarketRegime::DownOrSideways;
            }
            Err(e) => {
                warn!(instrument = %reference, error = %e, "Regime price unavailable");
                return MarketRegime::DownOrSideways;
            }
        };

        let regime = self.classify(&closes(&bars), price);
        debug!(instrument = %reference, %price, %regime, "Regime classified");
        regime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_broker::StaticMarket;
    use trading_core::types::Bar;

    fn daily(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::flat(i as i64 * 86_400_000, p))
            .collect()
    }

    #[test]
    fn test_classify() {
        let classifier = RegimeClassifier::new(RegimeConfig::default());
        let closes = [100.0, 101.0, 102.0, 103.0, 104.0];
        assert_eq!(classifier.classify(&closes, dec!(105)), MarketRegime::Up);
        // equal to the average is not up
        assert_eq!(classifier.classify(&closes, dec!(102)), MarketRegime::DownOrSideways);
        assert_eq!(classifier.classify(&closes[..3], dec!(500)), MarketRegime::DownOrSideways);
    }

    #[tokio::test]
    async fn test_evaluate_up() {
        let config = RegimeConfig::default();
        let market = StaticMarket::new();
        market.set_candles(
            &config.reference,
            CandleInterval::Day,
            daily(&[100.0, 100.0, 100.0, 100.0, 100.0]),
        );
        market.set_price(&config.reference, dec!(110));

        let classifier = RegimeClassifier::new(config);
        assert_eq!(classifier.evaluate(&market).await, MarketRegime::Up);
    }

    #[tokio::test]
    async fn test_evaluate_defaults_down_on_failure() {
        let config = RegimeConfig::default();
        let market = StaticMarket::new();
        // candles present, price missing
        market.set_candles(&config.reference, CandleInterval::Day, daily(&[1.0; 5]));

        let classifier = RegimeClassifier::new(config);
        assert_eq!(classifier.evaluate(&market).await, MarketRegime::DownOrSideways);

        let empty = StaticMarket::new();
        assert_eq!(classifier.evaluate(&empty).await, MarketRegime::DownOrSideways);
    }
}
