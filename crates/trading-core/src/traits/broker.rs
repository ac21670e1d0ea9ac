//! Trading terminal trait definition.

use crate::error::BrokerError;
use crate::types::{
    AccountInfo, Bar, ClosedDeal, OpenPosition, OrderReceipt, OrderRequest, Quote, SymbolInfo,
    TerminalInfo,
};
use async_trait::async_trait;

/// Trait for trading terminal integrations.
///
/// A terminal executes market deals, tracks open positions and reports
/// account and symbol information.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Initialize the connection and log in.
    async fn connect(&self) -> Result<TerminalInfo, BrokerError>;

    /// Release the terminal connection.
    async fn shutdown(&self) -> Result<(), BrokerError>;

    /// Make sure the symbol is selected and visible for trading.
    async fn ensure_symbol(&self, symbol: &str) -> Result<(), BrokerError>;

    /// Get trading properties of a symbol.
    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, BrokerError>;

    /// Get the latest tick.
    async fn quote(&self, symbol: &str) -> Result<Quote, BrokerError>;

    /// Get account information.
    async fn account(&self) -> Result<AccountInfo, BrokerError>;

    /// Submit a market deal.
    async fn send_order(&self, request: OrderRequest) -> Result<OrderReceipt, BrokerError>;

    /// Move stop-loss and take-profit of an open position.
    async fn modify_position(
        &self,
        ticket: u64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<(), BrokerError>;

    /// Get open positions, optionally filtered by symbol.
    async fn positions(&self, symbol: Option<&str>) -> Result<Vec<OpenPosition>, BrokerError>;

    /// Get the first open position on a symbol.
    async fn position(&self, symbol: &str) -> Result<Option<OpenPosition>, BrokerError> {
        Ok(self.positions(Some(symbol)).await?.into_iter().next())
    }

    /// Feed a closed bar to the terminal.
    ///
    /// Live terminals track the market themselves and ignore this; simulated
    /// ones reprice and settle protective levels, returning what closed.
    async fn on_bar(&self, _symbol: &str, _bar: &Bar) -> Result<Vec<ClosedDeal>, BrokerError> {
        Ok(Vec::new())
    }

    /// Get the terminal name.
    fn name(&self) -> &str;
}
