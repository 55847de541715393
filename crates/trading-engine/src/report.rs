//! One-shot market status, read from public data only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use trading_core::error::ExchangeError;
use trading_core::traits::MarketData;
use trading_core::types::Instrument;
use trading_indicators::IndicatorSnapshot;
use trading_strategies::{PositionMachine, StrategyConfig};

use crate::inputs::SnapshotBuilder;
use crate::settings::LoopSettings;

/// Indicator view of one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentStatus {
    pub instrument: Instrument,
    /// `None` when the instrument could not be read
    pub snapshot: Option<IndicatorSnapshot>,
    /// Entry condition and trend filter both pass
    pub entry_ready: bool,
    pub error: Option<String>,
}

/// Status table for the whole watch-list.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub strategy: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<InstrumentStatus>,
}

impl StatusReport {
    /// Read every watched instrument. A failing instrument gets an error
    /// row; the others are still reported.
    pub async fn collect<M>(
        market: &M,
        strategy: &StrategyConfig,
        settings: &LoopSettings,
        now: DateTime<Utc>,
    ) -> Self
    where
        M: MarketData + ?Sized,
    {
        let snapshots =
            SnapshotBuilder::new(strategy, settings.candle_interval, settings.candle_count);
        let machine = PositionMachine::new(strategy.clone());

        let mut rows = Vec::with_capacity(settings.instruments.len());
        for instrument in &settings.instruments {
            let row = match Self::read(market, &snapshots, instrument).await {
                Ok(snapshot) => InstrumentStatus {
                    instrument: instrument.clone(),
                    entry_ready: machine.entry_signal(&snapshot) && machine.trend_permits(&snapshot),
                    snapshot: Some(snapshot),
                    error: None,
                },
                Err(e) => InstrumentStatus {
                    instrument: instrument.clone(),
                    snapshot: None,
                    entry_ready: false,
                    error: Some(e.to_string()),
                },
            };
            rows.push(row);
        }

        Self {
            strategy: strategy.name.clone(),
            generated_at: now,
            rows,
        }
    }

    async fn read<M>(
        market: &M,
        snapshots: &SnapshotBuilder,
        instrument: &Instrument,
    ) -> Result<IndicatorSnapshot, ExchangeError>
    where
        M: MarketData + ?Sized,
    {
        let price = market
            .current_price(instrument)
            .await?
            .ok_or_else(|| ExchangeError::DataUnavailable(format!("no price for {}", instrument)))?;
        snapshots.build(market, instrument, price, true).await
    }

    /// Instruments whose entry condition holds right now.
    pub fn ready(&self) -> impl Iterator<Item = &Instrument> {
        self.rows.iter().filter(|r| r.entry_ready).map(|r| &r.instrument)
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════════════════════\n");
        s.push_str("                              MARKET STATUS                                 \n");
        s.push_str("═══════════════════════════════════════════════════════════════════════════\n\n");
        s.push_str(&format!("  Strategy:  {}\n", self.strategy));
        s.push_str(&format!(
            "  Time:      {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        s.push_str(&format!(
            "  {:<10} {:>14} {:>7} {:>14} {:>14} {:>8} {:>14}  {}\n",
            "MARKET", "PRICE", "RSI", "LOWER", "UPPER", "TARGET", "BREAKOUT", "ENTRY"
        ));
        s.push_str("───────────────────────────────────────────────────────────────────────────\n");

        for row in &self.rows {
            let Some(snap) = &row.snapshot else {
                s.push_str(&format!(
                    "  {:<10} error: {}\n",
                    row.instrument.symbol(),
                    row.error.as_deref().unwrap_or("unknown")
                ));
                continue;
            };
            let rsi = snap
                .rsi
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| "-".into());
            let breakout = snap
                .breakout
                .map(|b| format!("{:.2}", b.target))
                .unwrap_or_else(|| "-".into());
            s.push_str(&format!(
                "  {:<10} {:>14} {:>7} {:>14.2} {:>14.2} {:>7.2}% {:>14}  {}\n",
                row.instrument.symbol(),
                snap.current_price.normalize().to_string(),
                rsi,
                snap.lower_band,
                snap.upper_band,
                snap.dynamic_target_pct,
                breakout,
                if row.entry_ready { "READY" } else { "wait" },
            ));
        }
        s.push('\n');

        let ready: Vec<_> = self.ready().map(|i| i.symbol()).collect();
        s.push_str(&format!(
            "  Entry ready: {}\n",
            if ready.is_empty() { "none".to_string() } else { ready.join(", ") }
        ));
        s.push_str("═══════════════════════════════════════════════════════════════════════════\n");
        s
    }

    /// Count of rows that could not be read.
    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|r| r.error.is_some()).count()
    }

    /// Price of `instrument`, when it was read.
    pub fn price(&self, instrument: &Instrument) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| &r.instrument == instrument)
            .and_then(|r| r.snapshot.as_ref())
            .map(|s| s.current_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_broker::StaticMarket;
    use trading_core::types::{Bar, CandleInterval};

    fn series(closes: impl Iterator<Item = f64>) -> Vec<Bar> {
        closes
            .enumerate()
            .map(|(i, c)| Bar::flat(i as i64 * 900_000, c))
            .collect()
    }

    fn settings() -> LoopSettings {
        LoopSettings {
            instruments: vec![
                Instrument::new("KRW", "BTC"),
                Instrument::new("KRW", "ETH"),
                Instrument::new("KRW", "SOL"),
            ],
            ..Default::default()
        }
    }

    fn market() -> StaticMarket {
        let market = StaticMarket::new();
        let btc = Instrument::new("KRW", "BTC");
        let eth = Instrument::new("KRW", "ETH");
        market.set_candles(&btc, CandleInterval::Minute15, series((0..50).map(|i| 300.0 - i as f64)));
        market.set_price(&btc, dec!(250));
        market.set_candles(&eth, CandleInterval::Minute15, series((0..50).map(|i| 151.0 + i as f64)));
        market.set_price(&eth, dec!(200));
        market
    }

    #[tokio::test]
    async fn test_collect_marks_ready_and_failures() {
        let report =
            StatusReport::collect(&market(), &StrategyConfig::default(), &settings(), Utc::now()).await;

        assert_eq!(report.rows.len(), 3);
        // falling: RSI 0
        assert!(report.rows[0].entry_ready);
        assert_eq!(report.rows[0].snapshot.as_ref().and_then(|s| s.rsi), Some(0.0));
        // rising, price above the band
        assert!(!report.rows[1].entry_ready);
        // no data at all
        assert!(report.rows[2].error.is_some());

        assert_eq!(report.failures(), 1);
        assert_eq!(report.price(&Instrument::new("KRW", "ETH")), Some(dec!(200)));
        assert_eq!(
            report.ready().cloned().collect::<Vec<_>>(),
            vec![Instrument::new("KRW", "BTC")]
        );
    }

    #[tokio::test]
    async fn test_summary_lists_every_row() {
        let report =
            StatusReport::collect(&market(), &StrategyConfig::default(), &settings(), Utc::now()).await;
        let text = report.summary();

        assert!(text.contains("MARKET STATUS"));
        assert!(text.contains("KRW-BTC"));
        assert!(text.contains("READY"));
        assert!(text.contains("KRW-SOL error:"));
        assert!(text.contains("Entry ready: KRW-BTC"));
    }
}
