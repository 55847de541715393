//! Paper trading command.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use trading_broker::{PaperExchange, UpbitClient, UpbitConfig};
use trading_config::AppConfig;
use trading_engine::TradingLoop;

use crate::cli::runtime;
use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, mut config: AppConfig) -> Result<()> {
    runtime::apply_selection(&mut config, &args.selection)?;
    if let Some(balance) = args.balance {
        config.paper.initial_balance = balance;
        config.validate().context("Invalid --balance")?;
    }
    let strategy = runtime::strategy(&config)?;
    let settings = runtime::loop_settings(&config.engine);

    let market = UpbitClient::public(UpbitConfig {
        base_url: config.exchange.base_url.clone(),
        timeout: config.exchange.timeout(),
    })
    .context("Cannot create Upbit client")?;
    let exchange = PaperExchange::new(market, &settings.quote, config.paper.initial_balance)
        .with_fee(config.paper.fee_rate)
        .with_min_order(strategy.sizing.min_order);

    info!(
        strategy = %strategy.name,
        instruments = ?settings.instruments,
        balance = %config.paper.initial_balance,
        "Starting paper trading"
    );
    let notifier = runtime::notifier(&config.telegram, Some("[PAPER]"));
    let mut engine = TradingLoop::new(Arc::new(exchange), notifier, strategy, settings);
    engine
        .run(runtime::shutdown_signal())
        .await
        .context("Paper trading loop failed to start")?;
    Ok(())
}
