//! Loop timing and watch-list.

use std::time::Duration;
use trading_core::types::{CandleInterval, Instrument};
use trading_risk::DailyBoundary;

/// Everything the loop needs besides the strategy itself.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Evaluated in this order every tick
    pub instruments: Vec<Instrument>,
    /// Currency the account is valued in
    pub quote: String,
    pub candle_interval: CandleInterval,
    pub candle_count: usize,
    pub tick_interval: Duration,
    /// Sleep while the daily target is achieved
    pub idle_interval: Duration,
    /// Pause after every order submission
    pub order_settle: Duration,
    /// Pause between instruments
    pub instrument_pause: Duration,
    /// Sleep after a failed tick
    pub error_backoff: Duration,
    pub boundary: DailyBoundary,
    pub refresh_after_order: bool,
    pub reevaluate_regime_each_tick: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::new("KRW", "BTC"),
                Instrument::new("KRW", "ETH"),
                Instrument::new("KRW", "SOL"),
            ],
            quote: "KRW".to_string(),
            candle_interval: CandleInterval::Minute15,
            candle_count: 200,
            tick_interval: Duration::from_secs(1),
            idle_interval: Duration::from_secs(60),
            order_settle: Duration::from_secs(1),
            instrument_pause: Duration::from_millis(500),
            error_backoff: Duration::from_secs(10),
            boundary: DailyBoundary::default(),
            refresh_after_order: false,
            reevaluate_regime_each_tick: false,
        }
    }
}
