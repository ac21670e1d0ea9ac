//! Single decision command implementation.

use anyhow::{Context, Result};
use serde_json::json;
use trading_config::AppConfig;
use trading_core::types::TradeDecision;
use trading_data::CsvDataSource;
use trading_indicators::SnapshotBuilder;

use crate::cli::DecideArgs;
use crate::setup;

pub async fn run(args: DecideArgs, config: AppConfig) -> Result<()> {
    let dir = setup::data_dir(&config, args.data.as_deref());
    let source = CsvDataSource::new(dir)
        .with_context(|| format!("Data directory {} not found", dir.display()))?;

    let mut bars = source.load_all(&args.symbol, config.trader.timeframe)?;
    let skip = bars.len().saturating_sub(config.trader.data_bars);
    let bars = bars.split_off(skip);

    let snapshot = SnapshotBuilder::build(&args.symbol, config.indicators.clone(), &bars)?
        .with_context(|| format!("No bars for {}", args.symbol))?;

    let provider = setup::build_provider(&config, args.provider.unwrap_or(config.provider.kind))?;
    let decision = provider
        .produce_decision(&snapshot, None)
        .await
        .unwrap_or_else(|e| TradeDecision::fallback_with(e));

    let output = json!({
        "provider": provider.name(),
        "snapshot": snapshot,
        "decision": decision,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
