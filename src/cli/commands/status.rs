//! Market status command.

use anyhow::{Context, Result};
use chrono::Utc;
use trading_broker::{UpbitClient, UpbitConfig};
use trading_config::AppConfig;
use trading_engine::StatusReport;

use crate::cli::runtime;
use crate::cli::StatusArgs;

pub async fn run(args: StatusArgs, mut config: AppConfig) -> Result<()> {
    runtime::apply_selection(&mut config, &args.selection)?;
    let strategy = runtime::strategy(&config)?;
    let settings = runtime::loop_settings(&config.engine);

    let market = UpbitClient::public(UpbitConfig {
        base_url: config.exchange.base_url.clone(),
        timeout: config.exchange.timeout(),
    })
    .context("Cannot create Upbit client")?;

    let report = StatusReport::collect(&market, &strategy, &settings, Utc::now()).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    if report.failures() == report.rows.len() {
        anyhow::bail!("No instrument could be read");
    }
    Ok(())
}
