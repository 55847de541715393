//! CLI definitions.

pub mod commands;
pub mod runtime;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trading_core::types::Instrument;

#[derive(Parser)]
#[command(name = "trading-bot")]
#[command(author, version, about = "Unattended Upbit spot trading bot")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "TRADING_CONFIG")]
    pub config: PathBuf,

    /// Log level; overrides the configured one
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trade with real orders on Upbit
    Run(RunArgs),
    /// Trade against a simulated account fed by live market data
    Paper(PaperArgs),
    /// Print indicators and entry readiness for the watch-list
    Status(StatusArgs),
    /// List available strategies
    Strategies(StrategiesArgs),
    /// Validate configuration and print the effective settings
    ValidateConfig,
}

/// Overrides shared by every command that trades or reads the market.
#[derive(clap::Args, Clone, Default)]
pub struct SelectionArgs {
    /// Strategy preset; overrides `strategy.name`
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Markets to watch (comma-separated, e.g. KRW-BTC,KRW-ETH)
    #[arg(short = 'm', long, value_delimiter = ',')]
    pub instruments: Vec<Instrument>,
}

#[derive(clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Starting quote balance; overrides `paper.initial_balance`
    #[arg(long)]
    pub balance: Option<Decimal>,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct StrategiesArgs {
    /// Also print each preset's full parameter set
    #[arg(short, long)]
    pub verbose: bool,
}
