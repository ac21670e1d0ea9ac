//! Trading loop command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use trading_broker::{default_symbol_info, OrderManager, PaperTerminal};
use trading_config::{AppConfig, TerminalCredentials};
use trading_core::traits::Broker;
use trading_data::{CsvDataSource, MarketDataFetcher};
use trading_monitor::TradeJournal;

use crate::bot::{BotConfig, TradingBot};
use crate::cli::RunArgs;
use crate::setup;

pub async fn run(args: RunArgs, config: AppConfig) -> Result<()> {
    let symbols = if args.symbols.is_empty() {
        config.trader.symbols.clone()
    } else {
        args.symbols
    };
    let kind = args.provider.unwrap_or(config.provider.kind);

    let mut paper = setup::paper_config(&config);
    match TerminalCredentials::from_env(&config.terminal) {
        Ok(creds) => {
            info!(server = %creds.server, login = creds.login, "Terminal credentials loaded");
            paper.login = creds.login;
        }
        Err(e) => warn!(error = %e, "Running the paper terminal without a login"),
    }
    let mut terminal = PaperTerminal::new(paper);
    for symbol in &symbols {
        terminal = terminal.with_symbol(default_symbol_info(symbol));
    }
    let broker: Arc<dyn Broker> = Arc::new(terminal);

    let source = CsvDataSource::new(&config.data.dir).with_context(|| {
        format!("Data directory {} not found", config.data.dir.display())
    })?;
    let fetcher = MarketDataFetcher::new(
        Arc::new(source),
        setup::fetcher_config(&config),
        config.indicators.clone(),
    );

    let provider = setup::build_provider(&config, kind)?;
    let orders = OrderManager::new(broker.clone(), setup::order_config(&config));
    let journal = TradeJournal::new(&config.trader.log_dir)
        .with_context(|| format!("Cannot create {}", config.trader.log_dir.display()))?;

    let bot = TradingBot::new(
        BotConfig {
            symbols,
            interval: Duration::from_secs(config.trader.trade_interval_secs),
            max_concurrency: config.trader.max_concurrency,
        },
        broker,
        fetcher,
        provider,
        orders,
        journal,
    );

    bot.run(args.once).await?;
    Ok(())
}
