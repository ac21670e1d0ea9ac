//! The trading loop.

use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use trading_broker::OrderManager;
use trading_core::error::{DataError, TradingError};
use trading_core::traits::{Broker, DecisionProvider};
use trading_core::types::{ExecutionResult, ExecutionStatus, TradeDecision};
use trading_data::MarketDataFetcher;
use trading_monitor::{JournalEntry, MarketConditions, TradeContext, TradeJournal};
use trading_strategies::DecisionValidator;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub symbols: Vec<String>,
    pub interval: Duration,
    pub max_concurrency: usize,
}

/// Outcome of one pass over every symbol.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub results: Vec<ExecutionResult>,
    pub failures: Vec<(String, String)>,
}

impl CycleReport {
    pub fn count(&self, status: ExecutionStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Fetch, decide, execute and journal each symbol on a fixed interval.
pub struct TradingBot {
    config: BotConfig,
    broker: Arc<dyn Broker>,
    fetcher: MarketDataFetcher,
    provider: Arc<dyn DecisionProvider>,
    orders: OrderManager,
    journal: TradeJournal,
    validator: DecisionValidator,
}

impl TradingBot {
    pub fn new(
        config: BotConfig,
        broker: Arc<dyn Broker>,
        fetcher: MarketDataFetcher,
        provider: Arc<dyn DecisionProvider>,
        orders: OrderManager,
        journal: TradeJournal,
    ) -> Self {
        Self {
            config,
            broker,
            fetcher,
            provider,
            orders,
            journal,
            validator: DecisionValidator::structural(),
        }
    }

    /// Connect and report which symbols are tradeable.
    pub async fn verify_environment(&self) -> Result<(), TradingError> {
        let terminal = self.broker.connect().await?;
        info!(company = %terminal.company, server = %terminal.server, "Connected to terminal");

        for symbol in &self.config.symbols {
            if let Err(e) = self.broker.ensure_symbol(symbol).await {
                warn!(symbol = %symbol, error = %e, "Symbol unavailable");
                continue;
            }
            match self.broker.quote(symbol).await {
                Ok(quote) => info!(
                    symbol = %symbol,
                    bid = quote.bid,
                    ask = quote.ask,
                    spread_pips = quote.spread_pips(),
                    "Symbol available"
                ),
                Err(e) => info!(symbol = %symbol, error = %e, "Symbol available, no tick yet"),
            }
        }
        Ok(())
    }

    /// Process one symbol end to end.
    pub async fn process_symbol(&self, symbol: &str) -> Result<ExecutionResult, TradingError> {
        let data = self
            .fetcher
            .fetch(symbol)
            .await
            .ok_or_else(|| DataError::NoDataAvailable(symbol.to_string()))?;

        for deal in self.broker.on_bar(symbol, &data.last_bar).await? {
            info!(
                symbol,
                ticket = deal.ticket,
                close_price = deal.close_price,
                profit = %deal.profit,
                "Position closed at protective level"
            );
        }

        let position = self.broker.position(symbol).await?;
        let decision = self
            .provider
            .produce_decision(&data.snapshot, position.as_ref())
            .await
            .unwrap_or_else(|e| TradeDecision::fallback_with(e));
        info!(
            symbol,
            action = %decision.action,
            confidence = decision.confidence,
            reasoning = %decision.reasoning,
            "Decision"
        );

        let intent = self
            .validator
            .resolve_intent(decision, position.as_ref(), data.snapshot.close);
        let result = self.orders.execute(symbol, &intent).await;

        let context = self.context(symbol).await;
        self.journal.record(&JournalEntry::now(
            symbol,
            intent.decision().clone(),
            result.clone(),
            context,
        ));
        Ok(result)
    }

    async fn context(&self, symbol: &str) -> TradeContext {
        let balance = match self.broker.account().await {
            Ok(account) => account.balance,
            Err(_) => Decimal::ZERO,
        };
        let market_conditions = self
            .broker
            .quote(symbol)
            .await
            .ok()
            .map(|q| MarketConditions::from(&q));
        TradeContext {
            balance,
            market_conditions,
        }
    }

    /// Process every symbol, at most `max_concurrency` at a time. A failing
    /// symbol never affects the others.
    pub async fn run_cycle(&self) -> CycleReport {
        let outcomes: Vec<(String, Result<ExecutionResult, TradingError>)> =
            stream::iter(self.config.symbols.iter())
                .map(|symbol| async move { (symbol.clone(), self.process_symbol(symbol).await) })
                .buffer_unordered(self.config.max_concurrency.max(1))
                .collect()
                .await;

        let mut report = CycleReport::default();
        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Error processing symbol");
                    report.failures.push((symbol, e.to_string()));
                }
            }
        }
        report
    }

    /// Run until Ctrl-C, or for a single cycle with `once`.
    pub async fn run(&self, once: bool) -> Result<(), TradingError> {
        self.verify_environment().await?;
        info!(
            symbols = ?self.config.symbols,
            provider = self.provider.name(),
            interval_secs = self.config.interval.as_secs(),
            "Trading bot started"
        );

        loop {
            let started = Instant::now();
            let report = self.run_cycle().await;
            info!(
                executed = report.count(ExecutionStatus::Executed),
                adjusted = report.count(ExecutionStatus::Adjusted),
                hold = report.count(ExecutionStatus::Hold),
                errors = report.count(ExecutionStatus::Error) + report.failures.len(),
                "Cycle complete"
            );
            if once {
                break;
            }

            let elapsed = started.elapsed();
            let Some(remaining) = self.config.interval.checked_sub(elapsed) else {
                warn!(elapsed_secs = elapsed.as_secs(), "Cycle overran the trade interval");
                continue;
            };
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.broker.shutdown().await?;
        info!("Terminal connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use trading_broker::{default_symbol_info, OrderManagerConfig, PaperTerminal};
    use trading_data::{CsvDataSource, FetcherConfig};
    use trading_indicators::SnapshotConfig;
    use trading_monitor::load_entries;
    use trading_strategies::{DecisionEngine, EngineConfig, RuleProvider};

    fn write_history(dir: &std::path::Path, symbol: &str, n: usize) {
        let mut csv = String::from("time,open,high,low,close,tick_volume\n");
        for i in 0..n {
            let c = 1.1 + i as f64 * 0.0002;
            csv.push_str(&format!(
                "{},{:.5},{:.5},{:.5},{:.5},100\n",
                1_705_276_800 + i as i64 * 900,
                c,
                c + 0.0004,
                c - 0.0004,
                c
            ));
        }
        fs::write(dir.join(format!("{}_M15.csv", symbol)), csv).unwrap();
    }

    fn bot(data_dir: &std::path::Path, log_dir: &std::path::Path, symbols: &[&str]) -> TradingBot {
        let mut terminal = PaperTerminal::default();
        for s in symbols {
            terminal = terminal.with_symbol(default_symbol_info(s));
        }
        let broker: Arc<dyn Broker> = Arc::new(terminal);

        let source = Arc::new(CsvDataSource::new(data_dir).unwrap());
        let fetcher = MarketDataFetcher::new(
            source,
            FetcherConfig {
                bars: 200,
                max_retries: 1,
                retry_delay_secs: 0,
                ..Default::default()
            },
            SnapshotConfig::default(),
        );
        let engine = Arc::new(DecisionEngine::new(EngineConfig::default()).unwrap());

        TradingBot::new(
            BotConfig {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
                interval: Duration::from_secs(900),
                max_concurrency: 2,
            },
            broker.clone(),
            fetcher,
            Arc::new(RuleProvider::new(engine)),
            OrderManager::new(broker, OrderManagerConfig::default()),
            TradeJournal::new(log_dir).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_cycle_journals_every_symbol() {
        let data = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();
        write_history(data.path(), "EURUSD", 200);
        write_history(data.path(), "USDCAD", 200);

        let bot = bot(data.path(), logs.path(), &["EURUSD", "USDCAD"]);
        bot.verify_environment().await.unwrap();
        let report = bot.run_cycle().await;

        assert_eq!(report.results.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(load_entries(logs.path()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_symbol_is_isolated() {
        let data = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();
        write_history(data.path(), "EURUSD", 200);

        let bot = bot(data.path(), logs.path(), &["EURUSD", "XAUUSD"]);
        let report = bot.run_cycle().await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "XAUUSD");
    }

    #[tokio::test]
    async fn test_run_once_shuts_down() {
        let data = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();
        write_history(data.path(), "EURUSD", 120);

        let bot = bot(data.path(), logs.path(), &["EURUSD"]);
        bot.run(true).await.unwrap();
        assert_eq!(load_entries(logs.path()).unwrap().len(), 1);
    }
}
