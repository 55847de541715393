//! Live trading command.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use trading_broker::{Credentials, UpbitClient, UpbitConfig};
use trading_config::AppConfig;
use trading_engine::TradingLoop;

use crate::cli::runtime;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, mut config: AppConfig) -> Result<()> {
    runtime::apply_selection(&mut config, &args.selection)?;
    let strategy = runtime::strategy(&config)?;
    let settings = runtime::loop_settings(&config.engine);

    let credentials = Credentials::from_env(
        &config.exchange.access_key_env,
        &config.exchange.secret_key_env,
    )
    .with_context(|| {
        format!(
            "Set {} and {} to trade",
            config.exchange.access_key_env, config.exchange.secret_key_env
        )
    })?;
    let client = UpbitClient::new(
        UpbitConfig {
            base_url: config.exchange.base_url.clone(),
            timeout: config.exchange.timeout(),
        },
        credentials,
    )
    .context("Cannot create Upbit client")?;

    info!(
        strategy = %strategy.name,
        instruments = ?settings.instruments,
        "Starting live trading"
    );
    let notifier = runtime::notifier(&config.telegram, None);
    let mut engine = TradingLoop::new(Arc::new(client), notifier, strategy, settings);
    engine
        .run(runtime::shutdown_signal())
        .await
        .context("Trading loop failed to start")?;
    Ok(())
}
