//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::{api_key, AppConfig, ProviderKind, TerminalCredentials};
use trading_core::error::TradingError;

pub async fn run(loaded: Result<AppConfig, TradingError>, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("Validating configuration: defaults + config/default.toml"),
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Symbols: {}", config.trader.symbols.join(", "));
    println!("Timeframe: {}", config.trader.timeframe);
    println!("Risk per trade: {}%", config.trader.risk_percent);
    println!("Trade interval: {}s", config.trader.trade_interval_secs);
    println!("Provider: {}", config.provider.kind);
    println!();

    match TerminalCredentials::from_env(&config.terminal) {
        Ok(creds) => println!("Terminal credentials: login {} on {}", creds.login, creds.server),
        Err(e) => println!("Terminal credentials: {}", e),
    }
    if config.provider.kind == ProviderKind::Llm {
        match api_key(&config.provider.api_key_env) {
            Ok(_) => println!("API key: found in {}", config.provider.api_key_env),
            Err(e) => println!("API key: {}", e),
        }
    }

    Ok(())
}
