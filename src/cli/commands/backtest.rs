//! Backtest command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use trading_backtest::{BacktestConfig, BacktestEngine};
use trading_config::AppConfig;
use trading_core::types::{Bar, Timeframe};
use trading_data::CsvDataSource;

use crate::cli::{BacktestArgs, OutputFormat};
use crate::setup;

pub async fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    let symbols = if args.symbols.is_empty() {
        config.trader.symbols.clone()
    } else {
        args.symbols.clone()
    };
    let kind = args.provider.unwrap_or(config.provider.kind);
    info!(provider = %kind, symbols = ?symbols, "Starting backtest");

    let dir = setup::data_dir(&config, args.data.as_deref());
    let data = load_history(dir, &symbols, config.trader.timeframe)?;

    let initial_balance = match args.balance {
        Some(b) => Decimal::try_from(b).context("Invalid balance")?,
        None => config.terminal.paper_balance,
    };
    let backtest_config = BacktestConfig {
        initial_balance,
        spread_points: config.terminal.spread_points,
        orders: setup::order_config(&config),
        indicators: config.indicators.clone(),
    };

    let provider = setup::build_provider(&config, kind)?;
    let report = BacktestEngine::new(backtest_config)
        .run(provider.as_ref(), data)
        .await?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)?;
        info!("Results saved to {:?}", path);
    }
    if let Some(path) = &args.equity_csv {
        std::fs::write(path, report.equity_to_csv())?;
        info!("Equity curve saved to {:?}", path);
    }

    Ok(())
}

fn load_history(
    dir: &Path,
    symbols: &[String],
    timeframe: Timeframe,
) -> Result<HashMap<String, Vec<Bar>>> {
    let source = CsvDataSource::new(dir).with_context(|| {
        format!(
            "Data directory '{}' does not exist. Provide one with --data (e.g. --data ./data)",
            dir.display()
        )
    })?;

    let mut data = HashMap::new();
    for symbol in symbols {
        match source.load_all(symbol, timeframe) {
            Ok(bars) if !bars.is_empty() => {
                data.insert(symbol.clone(), bars);
            }
            Ok(_) => warn!(symbol = %symbol, "Empty history, skipping"),
            Err(e) => warn!(symbol = %symbol, error = %e, "No history, skipping"),
        }
    }

    if data.is_empty() {
        anyhow::bail!("No data loaded from {}", dir.display());
    }
    info!("Loaded data for {} symbols", data.len());
    Ok(data)
}
