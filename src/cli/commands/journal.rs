//! Trade journal summary command.

use anyhow::{Context, Result};
use trading_config::AppConfig;
use trading_monitor::{load_entries, JournalSummary};

use crate::cli::{JournalArgs, OutputFormat};

pub async fn run(args: JournalArgs, config: AppConfig) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| config.trader.log_dir.clone());
    let entries = load_entries(&dir)
        .with_context(|| format!("Failed to read journal in {}", dir.display()))?;
    let summary = JournalSummary::from_entries(&entries);

    if let OutputFormat::Json = args.output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Trade Journal: {}", dir.display());
    println!("═══════════════════════════════════════════════════════════");
    println!("  Entries:     {}", summary.entries);
    println!("  Executed:    {}", summary.executed);
    println!("  Adjusted:    {}", summary.adjusted);
    println!("  Hold:        {}", summary.hold);
    println!("  Errors:      {}", summary.errors);
    println!("  Profit:      {:.2}", summary.total_profit);
    println!();

    for (symbol, s) in &summary.symbols {
        println!(
            "  {:<8} decisions {:>5}  executed {:>4}  errors {:>4}  profit {:>10.2}",
            symbol, s.decisions, s.executed, s.errors, s.profit
        );
    }

    Ok(())
}
