//! List strategies command.

use anyhow::Result;
use trading_config::AppConfig;
use trading_strategies::StrategyRegistry;

pub async fn run(config: AppConfig) -> Result<()> {
    let registry = StrategyRegistry::new(&config.engine)?;

    println!("Rule Set (evaluated in priority order)");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {}. {} ({})", info.priority, info.name, info.key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  {}", info.config);
        println!();
    }

    println!("Snapshots backed by fewer than {} bars always hold.", config.engine.min_bars);

    Ok(())
}
