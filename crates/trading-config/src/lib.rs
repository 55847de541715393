//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, EngineSettings, ExchangeSettings, LoggingConfig, PaperSettings,
    StrategySelection, TelegramSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from file and environment, then validate it.
///
/// Environment variables use the `TRADING` prefix and `__` as the section
/// separator, e.g. `TRADING__ENGINE__TICK_INTERVAL_MS=2000`.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRADING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
