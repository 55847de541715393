//! Market reads that feed one decision.

use rust_decimal::Decimal;
use tracing::debug;
use trading_core::error::ExchangeError;
use trading_core::traits::MarketData;
use trading_core::types::{CandleInterval, Instrument};
use trading_indicators::{trend_average, BreakoutLevel, IndicatorEngine, IndicatorSnapshot};
use trading_strategies::{EntrySignal, StrategyConfig, TrendFilter};

/// Fetches candles and builds the [`IndicatorSnapshot`] a strategy needs.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    indicators: IndicatorEngine,
    interval: CandleInterval,
    count: usize,
    breakout: Option<BreakoutLevel>,
    trend: Option<TrendFilter>,
}

impl SnapshotBuilder {
    pub fn new(strategy: &StrategyConfig, interval: CandleInterval, count: usize) -> Self {
        let indicators = IndicatorEngine::new(&strategy.indicators);
        let breakout = match strategy.entry {
            EntrySignal::Breakout { k, ma_window } => Some(BreakoutLevel::new(k, ma_window)),
            EntrySignal::Oversold { .. } => None,
        };
        Self {
            count: count.max(indicators.lookback()),
            indicators,
            interval,
            breakout,
            trend: strategy.trend_filter.clone(),
        }
    }

    /// Candles requested per instrument.
    pub fn candle_count(&self) -> usize {
        self.count
    }

    /// Snapshot at `price`. Entry-only inputs (trend average, breakout
    /// level) are fetched only when `for_entry` is set; failing to get
    /// them leaves the field unset, which blocks entry.
    pub async fn build<M>(
        &self,
        market: &M,
        instrument: &Instrument,
        price: Decimal,
        for_entry: bool,
    ) -> Result<IndicatorSnapshot, ExchangeError>
    where
        M: MarketData + ?Sized,
    {
        let bars = market.candles(instrument, self.interval, self.count).await?;
        let snapshot = self.indicators.snapshot(&bars, price)?;
        if !for_entry {
            return Ok(snapshot);
        }

        let trend_ma = match &self.trend {
            Some(filter) => match market.candles(instrument, filter.interval, filter.window).await {
                Ok(bars) => trend_average(&bars, filter.window),
                Err(e) => {
                    debug!(instrument = %instrument, error = %e, "Trend candles unavailable");
                    None
                }
            },
            None => None,
        };

        let breakout = match &self.breakout {
            Some(level) => match market
                .candles(instrument, CandleInterval::Day, level.required_days())
                .await
            {
                Ok(daily) => level.calculate(&daily),
                Err(e) => {
                    debug!(instrument = %instrument, error = %e, "Daily candles unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(snapshot.with_trend(trend_ma).with_breakout(breakout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_broker::StaticMarket;
    use trading_core::types::Bar;

    fn flat(n: usize, price: f64) -> Vec<Bar> {
        (0..n).map(|i| Bar::flat(i as i64 * 60_000, price)).collect()
    }

    #[tokio::test]
    async fn test_short_history_is_unavailable() {
        let market = StaticMarket::new();
        let btc = Instrument::new("KRW", "BTC");
        market.set_candles(&btc, CandleInterval::Minute15, flat(10, 100.0));

        let builder = SnapshotBuilder::new(&StrategyConfig::default(), CandleInterval::Minute15, 200);
        let err = builder.build(&market, &btc, dec!(100), true).await.unwrap_err();
        assert!(matches!(err, ExchangeError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_entry_inputs_only_when_needed() {
        let market = StaticMarket::new();
        let btc = Instrument::new("KRW", "BTC");
        market.set_candles(&btc, CandleInterval::Minute15, flat(50, 100.0));
        market.set_candles(&btc, CandleInterval::Minute60, flat(20, 90.0));

        let strategy = StrategyConfig {
            trend_filter: Some(TrendFilter::default()),
            ..Default::default()
        };
        let builder = SnapshotBuilder::new(&strategy, CandleInterval::Minute15, 200);

        let snap = builder.build(&market, &btc, dec!(100), true).await.unwrap();
        assert_eq!(snap.trend_ma, Some(90.0));

        let snap = builder.build(&market, &btc, dec!(100), false).await.unwrap();
        assert_eq!(snap.trend_ma, None);
    }

    #[tokio::test]
    async fn test_breakout_level_from_daily() {
        let market = StaticMarket::new();
        let btc = Instrument::new("KRW", "BTC");
        market.set_candles(&btc, CandleInterval::Minute15, flat(50, 100.0));
        market.set_candles(
            &btc,
            CandleInterval::Day,
            vec![
                Bar::new(0, 100.0, 120.0, 90.0, 110.0, 0.0),
                Bar::new(1, 110.0, 118.0, 108.0, 116.0, 0.0),
            ],
        );

        let strategy = StrategyConfig {
            entry: EntrySignal::Breakout { k: 0.5, ma_window: 2 },
            ..Default::default()
        };
        let builder = SnapshotBuilder::new(&strategy, CandleInterval::Minute15, 200);
        let snap = builder.build(&market, &btc, dec!(126), true).await.unwrap();
        let level = snap.breakout.unwrap();
        assert!((level.target - 125.0).abs() < 1e-9);
    }
}
