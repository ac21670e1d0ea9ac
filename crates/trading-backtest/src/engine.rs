//! Bar-by-bar replay of the decision pipeline.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_broker::{OrderManager, OrderManagerConfig, PaperTerminal, PaperTerminalConfig};
use trading_core::error::TradingError;
use trading_core::traits::{Broker, DecisionProvider};
use trading_core::types::{Bar, TradeDecision};
use trading_indicators::{SnapshotBuilder, SnapshotConfig};
use trading_strategies::DecisionValidator;

use crate::report::BacktestReport;
use crate::statistics::BacktestStats;

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_balance: Decimal,
    /// Ask minus bid, in points
    pub spread_points: f64,
    pub orders: OrderManagerConfig,
    pub indicators: SnapshotConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            spread_points: 10.0,
            orders: OrderManagerConfig::default(),
            indicators: SnapshotConfig::default(),
        }
    }
}

/// Backtesting engine.
///
/// Every bar first settles protective levels on the paper terminal, then
/// extends the symbol's snapshot and runs it through the provider and the
/// order manager at the bar's close. Positions still open after the last
/// bar are closed at the final quote.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub async fn run(
        &self,
        provider: &dyn DecisionProvider,
        data: HashMap<String, Vec<Bar>>,
    ) -> Result<BacktestReport, TradingError> {
        let terminal = Arc::new(PaperTerminal::new(PaperTerminalConfig {
            initial_balance: self.config.initial_balance,
            spread_points: self.config.spread_points,
            ..Default::default()
        }));
        let orders = OrderManager::new(terminal.clone(), self.config.orders.clone());
        let validator = DecisionValidator::structural();

        let mut builders = HashMap::new();
        for symbol in data.keys() {
            builders.insert(
                symbol.clone(),
                SnapshotBuilder::new(symbol.clone(), self.config.indicators.clone())?,
            );
        }

        let mut events: Vec<(&str, Bar)> = data
            .iter()
            .flat_map(|(symbol, bars)| bars.iter().map(move |b| (symbol.as_str(), *b)))
            .collect();
        events.sort_by_key(|(_, bar)| bar.timestamp);

        info!(
            provider = provider.name(),
            symbols = data.len(),
            bars = events.len(),
            "Starting backtest"
        );

        let mut stats = BacktestStats::new(self.config.initial_balance);
        for (symbol, bar) in events {
            for deal in terminal.on_bar(symbol, &bar).await? {
                debug!(symbol, ticket = deal.ticket, profit = %deal.profit, "Position settled");
                stats.add_trade(deal.into());
            }

            let Some(builder) = builders.get_mut(symbol) else {
                continue;
            };
            let snapshot = match builder.push(&bar) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(symbol, error = %e, "Skipping bar");
                    continue;
                }
            };

            let position = terminal.position(symbol).await?;
            let decision = provider
                .produce_decision(&snapshot, position.as_ref())
                .await
                .unwrap_or_else(|e| TradeDecision::fallback_with(e));
            let intent = validator.resolve_intent(decision, position.as_ref(), snapshot.close);
            let result = orders.execute(symbol, &intent).await;
            stats.decisions.record(result.status);

            stats.record_equity(bar.timestamp, terminal.equity());
        }

        for deal in terminal.close_all() {
            stats.add_trade(deal.into());
        }
        stats.finalize(terminal.balance());

        info!(
            trades = stats.total_trades,
            net_profit = %stats.net_profit,
            "Backtest finished"
        );

        Ok(BacktestReport {
            provider: provider.name().to_string(),
            config: self.config.clone(),
            stats,
        })
    }
}
