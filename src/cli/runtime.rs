//! Wiring shared by the commands: strategy, watch-list, notifier and the
//! shutdown signal.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use trading_config::{AppConfig, EngineSettings, TelegramSettings};
use trading_engine::LoopSettings;
use trading_monitor::{LogNotifier, NotificationChannel, TelegramConfig, TelegramNotifier};
use trading_strategies::{StrategyConfig, StrategyRegistry};

use crate::cli::SelectionArgs;

/// Loop settings from the `[engine]` section.
pub fn loop_settings(engine: &EngineSettings) -> LoopSettings {
    LoopSettings {
        instruments: engine.instruments.clone(),
        quote: engine.quote().to_string(),
        candle_interval: engine.candle_interval,
        candle_count: engine.candle_count,
        tick_interval: engine.tick_interval(),
        idle_interval: engine.idle_interval(),
        order_settle: engine.order_settle(),
        instrument_pause: engine.instrument_pause(),
        error_backoff: engine.error_backoff(),
        boundary: engine.boundary(),
        refresh_after_order: engine.refresh_after_order,
        reevaluate_regime_each_tick: engine.reevaluate_regime_each_tick,
    }
}

/// Apply command-line overrides and re-validate.
pub fn apply_selection(config: &mut AppConfig, selection: &SelectionArgs) -> Result<()> {
    if let Some(name) = &selection.strategy {
        config.strategy.name = name.clone();
    }
    if !selection.instruments.is_empty() {
        config.engine.instruments = selection.instruments.clone();
    }
    config.validate().context("Invalid command-line overrides")?;
    Ok(())
}

/// Build the selected preset with its configured overrides.
pub fn strategy(config: &AppConfig) -> Result<StrategyConfig> {
    let registry = StrategyRegistry::new();
    registry
        .create(&config.strategy.name, config.strategy.overrides.clone())
        .with_context(|| format!("Cannot build strategy '{}'", config.strategy.name))
}

/// Telegram when enabled and its credentials are present, the log
/// otherwise.
pub fn notifier(settings: &TelegramSettings, tag: Option<&str>) -> NotificationChannel {
    let log = || NotificationChannel::new(Arc::new(LogNotifier), settings.timeout());
    if !settings.enabled {
        return log();
    }

    let (Ok(token), Ok(chat_id)) = (
        std::env::var(&settings.token_env),
        std::env::var(&settings.chat_id_env),
    ) else {
        warn!(
            token_env = %settings.token_env,
            chat_id_env = %settings.chat_id_env,
            "Telegram enabled but credentials missing, notifying to the log"
        );
        return log();
    };

    let prefix = match tag {
        Some(tag) => format!("{} {}", settings.prefix, tag),
        None => settings.prefix.clone(),
    };
    let mut config = TelegramConfig::new(token, chat_id).with_prefix(prefix);
    config.timeout = settings.timeout();

    match TelegramNotifier::new(config) {
        Ok(telegram) => {
            info!("Telegram notifications enabled");
            NotificationChannel::new(Arc::new(telegram), settings.timeout())
        }
        Err(e) => {
            warn!(error = %e, "Telegram client unavailable, notifying to the log");
            log()
        }
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::Instrument;

    #[test]
    fn test_loop_settings_follow_engine_section() {
        let config = AppConfig::default();
        let settings = loop_settings(&config.engine);
        assert_eq!(settings.instruments, config.engine.instruments);
        assert_eq!(settings.quote, "KRW");
        assert_eq!(settings.tick_interval, config.engine.tick_interval());
        assert_eq!(settings.boundary, config.engine.boundary());
    }

    #[test]
    fn test_selection_overrides() {
        let mut config = AppConfig::default();
        let selection = SelectionArgs {
            strategy: Some("scalper".into()),
            instruments: vec![Instrument::new("KRW", "XRP")],
        };
        apply_selection(&mut config, &selection).unwrap();
        assert_eq!(config.strategy.name, "scalper");
        assert_eq!(config.engine.instruments, vec![Instrument::new("KRW", "XRP")]);
        assert_eq!(strategy(&config).unwrap().name, "scalper");
    }

    #[test]
    fn test_unknown_strategy() {
        let mut config = AppConfig::default();
        config.strategy.name = "martingale".into();
        assert!(strategy(&config).is_err());
    }

    #[test]
    fn test_disabled_telegram_logs() {
        let channel = notifier(&TelegramSettings::default(), None);
        assert_eq!(channel.timeout(), TelegramSettings::default().timeout());
    }
}
