//! FX trading bot CLI application.

mod bot;
mod cli;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use trading_config::load_config;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref());

    // Logging comes up before the config is known to be valid
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or(logging.level);
    let json = cli.json_logs || logging.format == "json";
    let _log_guard = setup_logging(&level, json, logging.file.as_deref().map(Path::new));

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(loaded, cli.config.as_deref()).await;
    }
    let config = loaded?;

    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, config).await,
        Commands::Decide(args) => cli::commands::decide::run(args, config).await,
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Journal(args) => cli::commands::journal::run(args, config).await,
        Commands::Strategies => cli::commands::strategies::run(config).await,
        Commands::ValidateConfig => Ok(()),
    }
}
