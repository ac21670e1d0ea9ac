//! Turns resolved trade intents into terminal requests.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use trading_core::error::BrokerError;
use trading_core::traits::Broker;
use trading_core::types::{
    Direction, ExecutionResult, OrderRequest, PositionAdjustment, TradeDecision, TradeIntent,
};
use trading_risk::{LotSizer, LotSizerConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderManagerConfig {
    /// Maximum slippage in points
    pub deviation: u32,
    /// Comment attached to every deal
    pub comment: String,
    pub sizing: LotSizerConfig,
}

impl Default for OrderManagerConfig {
    fn default() -> Self {
        Self {
            deviation: 20,
            comment: "AI Trade".to_string(),
            sizing: LotSizerConfig::default(),
        }
    }
}

/// Executes intents against a terminal.
///
/// Never fails: every problem is reported as an `error` result so one bad
/// symbol cannot take down the cycle.
pub struct OrderManager {
    broker: Arc<dyn Broker>,
    sizer: LotSizer,
    config: OrderManagerConfig,
}

impl OrderManager {
    pub fn new(broker: Arc<dyn Broker>, config: OrderManagerConfig) -> Self {
        Self {
            broker,
            sizer: LotSizer::new(config.sizing.clone()),
            config,
        }
    }

    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }

    pub fn config(&self) -> &OrderManagerConfig {
        &self.config
    }

    pub async fn execute(&self, symbol: &str, intent: &TradeIntent) -> ExecutionResult {
        let outcome = match intent {
            TradeIntent::Stand(_) => return ExecutionResult::hold(symbol),
            TradeIntent::Open(decision) => self.open(symbol, decision).await,
            TradeIntent::Adjust { adjustment, .. } => self.adjust(adjustment).await,
        };

        outcome.unwrap_or_else(|e| {
            error!(symbol, error = %e, "Execution failed");
            ExecutionResult::error(symbol, e)
        })
    }

    async fn open(
        &self,
        symbol: &str,
        decision: &TradeDecision,
    ) -> Result<ExecutionResult, BrokerError> {
        let Some(direction) = decision.action.direction() else {
            return Ok(ExecutionResult::hold(symbol));
        };
        if decision.stop_loss <= 0.0 || decision.take_profit <= 0.0 {
            return Err(BrokerError::OrderRejected("Invalid SL/TP values".to_string()));
        }

        let info = self.broker.symbol_info(symbol).await?;
        if info.point <= 0.0 {
            return Err(BrokerError::InvalidSymbolInfo(format!(
                "Invalid symbol point value for {}",
                symbol
            )));
        }

        let quote = self.broker.quote(symbol).await?;
        let price = quote.entry_price(direction);
        let (below, above) = match direction {
            Direction::Long => (decision.stop_loss, decision.take_profit),
            Direction::Short => (decision.take_profit, decision.stop_loss),
        };
        if !(below < price && price < above) {
            return Err(BrokerError::OrderRejected(format!(
                "SL/TP {}/{} not on either side of entry price {}",
                decision.stop_loss, decision.take_profit, price
            )));
        }
        let account = self.broker.account().await?;
        let volume = self
            .sizer
            .calculate(account.balance, price, decision.stop_loss, &info)?;

        let request = OrderRequest::market(symbol, direction, volume, price)
            .with_levels(decision.stop_loss, decision.take_profit)
            .with_deviation(self.config.deviation)
            .with_comment(self.config.comment.clone());

        let receipt = self.broker.send_order(request).await?;
        info!(
            symbol,
            ticket = receipt.ticket,
            action = %decision.action,
            volume = %receipt.volume,
            price = receipt.price,
            "Order executed"
        );
        Ok(ExecutionResult::executed(&receipt))
    }

    async fn adjust(&self, adjustment: &PositionAdjustment) -> Result<ExecutionResult, BrokerError> {
        if adjustment.stop_loss <= 0.0 || adjustment.take_profit <= 0.0 {
            warn!(ticket = adjustment.ticket, "Adjustment without levels ignored");
            return Err(BrokerError::OrderRejected("Invalid SL/TP values".to_string()));
        }
        self.broker
            .modify_position(adjustment.ticket, adjustment.stop_loss, adjustment.take_profit)
            .await?;
        info!(
            symbol = %adjustment.symbol,
            ticket = adjustment.ticket,
            sl = adjustment.stop_loss,
            tp = adjustment.take_profit,
            "Position adjusted"
        );
        Ok(ExecutionResult::adjusted(
            &adjustment.symbol,
            adjustment.ticket,
            adjustment.stop_loss,
            adjustment.take_profit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperTerminal;
    use rust_decimal_macros::dec;
    use trading_core::types::{ExecutionStatus, TradeAction};

    fn setup() -> (Arc<PaperTerminal>, OrderManager) {
        let terminal = Arc::new(PaperTerminal::default());
        terminal.set_quote("EURUSD", 1.10500, 1);
        let manager = OrderManager::new(terminal.clone(), OrderManagerConfig::default());
        (terminal, manager)
    }

    fn buy() -> TradeDecision {
        TradeDecision::directional(TradeAction::Buy, 1.10320, 1.10800, 0.85, "trend")
    }

    #[tokio::test]
    async fn test_hold_sends_nothing() {
        let (terminal, manager) = setup();
        let result = manager
            .execute("EURUSD", &TradeIntent::Stand(TradeDecision::no_signal()))
            .await;

        assert_eq!(result.status, ExecutionStatus::Hold);
        assert!(terminal.positions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_sizes_from_risk() {
        let (terminal, manager) = setup();
        let result = manager.execute("EURUSD", &TradeIntent::Open(buy())).await;

        assert_eq!(result.status, ExecutionStatus::Executed);
        // 100 USD risk over 190 points
        assert_eq!(result.volume, Some(dec!(0.52)));
        assert_eq!(result.sl, Some(1.10320));

        let position = terminal.position("EURUSD").await.unwrap().unwrap();
        assert_eq!(position.direction, Direction::Long);
    }

    #[tokio::test]
    async fn test_missing_levels_is_error_result() {
        let (_, manager) = setup();
        let decision = TradeDecision::directional(TradeAction::Sell, 0.0, 1.1, 0.7, "");
        let result = manager.execute("EURUSD", &TradeIntent::Open(decision)).await;

        assert_eq!(result.status, ExecutionStatus::Error);
        assert!(result.error.unwrap().contains("Invalid SL/TP"));
    }

    #[tokio::test]
    async fn test_target_inside_spread_is_rejected() {
        let (terminal, manager) = setup();
        // bid 1.10500, ask 1.10510: target above the bid but below the fill
        let decision = TradeDecision::directional(TradeAction::Buy, 1.10320, 1.10505, 0.85, "");
        let result = manager.execute("EURUSD", &TradeIntent::Open(decision)).await;

        assert_eq!(result.status, ExecutionStatus::Error);
        assert!(result.error.unwrap().contains("entry price"));
        assert!(terminal.positions(None).await.unwrap().is_empty());

        let sell = TradeDecision::directional(TradeAction::Sell, 1.10700, 1.10300, 0.85, "");
        let result = manager.execute("EURUSD", &TradeIntent::Open(sell)).await;
        assert_eq!(result.status, ExecutionStatus::Executed);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_error_result() {
        let (_, manager) = setup();
        let result = manager.execute("GBPNZD", &TradeIntent::Open(buy())).await;
        assert_eq!(result.status, ExecutionStatus::Error);
    }

    #[tokio::test]
    async fn test_adjust_moves_levels() {
        let (terminal, manager) = setup();
        manager.execute("EURUSD", &TradeIntent::Open(buy())).await;
        let position = terminal.position("EURUSD").await.unwrap().unwrap();

        let decision = TradeDecision::directional(TradeAction::Buy, 1.10400, 1.10900, 0.85, "");
        let intent = TradeIntent::resolve(decision, Some(&position));
        let result = manager.execute("EURUSD", &intent).await;

        assert_eq!(result.status, ExecutionStatus::Adjusted);
        let moved = terminal.position("EURUSD").await.unwrap().unwrap();
        assert_eq!(moved.stop_loss, 1.10400);
        assert_eq!(moved.take_profit, 1.10900);
    }
}
