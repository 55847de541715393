//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::AppConfig;

use crate::cli::runtime;

pub async fn run(config: AppConfig, path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", path);

    let strategy = runtime::strategy(&config)?;
    let settings = runtime::loop_settings(&config.engine);

    println!("Configuration is valid!");
    println!();
    println!("Strategy:    {}", strategy.name);
    println!(
        "Markets:     {}",
        settings
            .instruments
            .iter()
            .map(|i| i.symbol())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Daily reset: {} {}",
        settings.boundary.reset_time(),
        config.engine.timezone
    );
    println!(
        "Governor:    {}",
        if strategy.governor.enabled {
            format!(
                "up {}% / down {}%",
                strategy.governor.target_up * rust_decimal::Decimal::ONE_HUNDRED,
                strategy.governor.target_down * rust_decimal::Decimal::ONE_HUNDRED
            )
        } else {
            "off".to_string()
        }
    );
    println!();
    println!("Effective settings");
    println!("───────────────────────────────────────────────────────────");
    print!("{}", config.to_toml()?);

    Ok(())
}
