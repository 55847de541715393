//! Trading bot CLI application.

mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use trading_config::{load_config, AppConfig};
use trading_monitor::{setup_logging, LogFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Secrets may live in a local .env file
    dotenvy::dotenv().ok();

    let command = match cli.command {
        Commands::Strategies(args) => {
            let level = cli.log_level.map(|l| l.as_str()).unwrap_or("warn");
            let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Compact };
            let _guard = setup_logging(level, format, None);
            return cli::commands::strategies::run(args).await;
        }
        command => command,
    };

    let config = load_config(&cli.config)
        .with_context(|| format!("Cannot load configuration from {:?}", cli.config))?;

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str())
        .unwrap_or(config.logging.level.as_str())
        .to_string();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.logging.format.parse::<LogFormat>().map_err(|e| anyhow!(e))?
    };
    let file_dir = config.logging.file_dir.clone();
    let _guard = setup_logging(&level, format, file_dir.as_deref().map(Path::new));

    // Execute command
    dispatch(command, config, &cli.config).await
}

async fn dispatch(command: Commands, config: AppConfig, path: &Path) -> Result<()> {
    match command {
        Commands::Run(args) => cli::commands::run::run(args, config).await,
        Commands::Paper(args) => cli::commands::paper::run(args, config).await,
        Commands::Status(args) => cli::commands::status::run(args, config).await,
        Commands::Strategies(args) => cli::commands::strategies::run(args).await,
        Commands::ValidateConfig => cli::commands::validate::run(config, path).await,
    }
}
