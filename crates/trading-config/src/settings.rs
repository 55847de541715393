//! Configuration structures.

use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trading_core::types::{CandleInterval, Instrument};
use trading_risk::DailyBoundary;

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub strategy: StrategySelection,
    #[serde(default)]
    pub paper: PaperSettings,
}

impl AppConfig {
    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.engine.validate()?;
        if self.strategy.name.trim().is_empty() {
            return Err(SettingsError::Invalid("strategy.name is empty".into()));
        }
        if self.paper.initial_balance < Decimal::ZERO {
            return Err(SettingsError::Invalid("paper.initial_balance is negative".into()));
        }
        if self.paper.fee_rate < Decimal::ZERO || self.paper.fee_rate >= Decimal::ONE {
            return Err(SettingsError::Invalid("paper.fee_rate must be in [0, 1)".into()));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Invalid(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "upbit-trading-bot".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `compact` or `json`
    pub format: String,
    /// Directory for the rotated log file; console only when unset
    pub file_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_dir: None,
        }
    }
}

/// Exchange API settings. Keys live in the environment, never in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub access_key_env: String,
    pub secret_key_env: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            access_key_env: "UPBIT_ACCESS_KEY".to_string(),
            secret_key_env: "UPBIT_SECRET_KEY".to_string(),
            base_url: "https://api.upbit.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ExchangeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Telegram notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub token_env: String,
    pub chat_id_env: String,
    pub prefix: String,
    pub timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            token_env: "TELEGRAM_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            prefix: "🤖 [Bot]".to_string(),
            timeout_secs: 5,
        }
    }
}

impl TelegramSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Trading loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Watch-list, evaluated in this order every tick
    pub instruments: Vec<Instrument>,
    pub candle_interval: CandleInterval,
    pub candle_count: usize,
    pub tick_interval_ms: u64,
    /// Sleep while the daily target is achieved
    pub idle_interval_secs: u64,
    /// Pause after every order submission
    pub order_settle_ms: u64,
    /// Pause between instruments
    pub instrument_pause_ms: u64,
    /// Sleep after a failed tick
    pub error_backoff_secs: u64,
    /// Local time of the daily reset
    pub reset_time: NaiveTime,
    pub timezone: Tz,
    /// Re-read balances after each accepted order within a tick
    pub refresh_after_order: bool,
    /// Re-classify the regime on every tick instead of only at start and
    /// reset
    pub reevaluate_regime_each_tick: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::new("KRW", "BTC"),
                Instrument::new("KRW", "ETH"),
                Instrument::new("KRW", "SOL"),
            ],
            candle_interval: CandleInterval::Minute15,
            candle_count: 200,
            tick_interval_ms: 1000,
            idle_interval_secs: 60,
            order_settle_ms: 1000,
            instrument_pause_ms: 500,
            error_backoff_secs: 10,
            reset_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            timezone: chrono_tz::Asia::Seoul,
            refresh_after_order: false,
            reevaluate_regime_each_tick: false,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.instruments.is_empty() {
            return Err(SettingsError::Invalid("engine.instruments is empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol()) {
                return Err(SettingsError::Invalid(format!(
                    "engine.instruments lists {} twice",
                    instrument
                )));
            }
        }
        let quote = self.instruments[0].quote();
        if self.instruments.iter().any(|i| i.quote() != quote) {
            return Err(SettingsError::Invalid(
                "engine.instruments must share one quote currency".into(),
            ));
        }
        if self.candle_count == 0 || self.candle_count > 200 {
            return Err(SettingsError::Invalid("engine.candle_count must be 1..=200".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid("engine.tick_interval_ms must be positive".into()));
        }
        if self.error_backoff_secs * 1000 <= self.tick_interval_ms {
            return Err(SettingsError::Invalid(
                "engine.error_backoff_secs must exceed the tick interval".into(),
            ));
        }
        Ok(())
    }

    /// Quote currency shared by the watch-list.
    pub fn quote(&self) -> &str {
        self.instruments.first().map(|i| i.quote()).unwrap_or("KRW")
    }

    pub fn boundary(&self) -> DailyBoundary {
        DailyBoundary::new(self.timezone, self.reset_time)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn order_settle(&self) -> Duration {
        Duration::from_millis(self.order_settle_ms)
    }

    pub fn instrument_pause(&self) -> Duration {
        Duration::from_millis(self.instrument_pause_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Which preset to run, with optional parameter overrides merged on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySelection {
    pub name: String,
    #[serde(default)]
    pub overrides: Option<serde_json::Value>,
}

impl Default for StrategySelection {
    fn default() -> Self {
        Self {
            name: "survivor".to_string(),
            overrides: None,
        }
    }
}

/// Simulated account for the `paper` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    pub initial_balance: Decimal,
    /// Per-side fee
    pub fee_rate: Decimal,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            initial_balance: dec!(1000000),
            fee_rate: dec!(0.0005),
        }
    }
}
