//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trading_config::ProviderKind;

#[derive(Parser)]
#[command(name = "fx-trader")]
#[command(author, version, about = "Indicator-driven FX trading bot")]
pub struct Cli {
    /// Configuration file path (defaults to config/default.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configured level)
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
    /// Run the trading loop against the paper terminal
    Run(RunArgs),
    /// Print the decision for the latest bar of one symbol
    Decide(DecideArgs),
    /// Replay CSV history through a decision provider
    Backtest(BacktestArgs),
    /// Summarise trade journal files
    Journal(JournalArgs),
    /// List the rule set in priority order
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Decision provider (overrides the configured one)
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Symbols to trade (comma-separated, overrides the configured list)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,
}

#[derive(clap::Args)]
pub struct DecideArgs {
    /// Symbol to evaluate
    #[arg(short = 'S', long)]
    pub symbol: String,

    /// Directory of CSV history (overrides data.dir)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Decision provider (overrides the configured one)
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Symbols to replay (comma-separated, defaults to the configured list)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Directory of CSV history (overrides data.dir)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Decision provider (overrides the configured one)
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Initial balance (overrides terminal.paper_balance)
    #[arg(long)]
    pub balance: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct JournalArgs {
    /// Journal directory (overrides trader.log_dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}
