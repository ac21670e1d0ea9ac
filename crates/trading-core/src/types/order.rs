//! Order requests sent to the terminal and what comes back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// Order expiration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good til canceled
    #[default]
    Gtc,
    /// Immediate or cancel
    Ioc,
    /// Fill or kill
    Fok,
}

/// Market deal request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    /// Lots
    pub volume: Decimal,
    /// Price the request was priced at (ask for buys, bid for sells)
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Maximum slippage in points
    pub deviation: u32,
    pub comment: String,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Create a market deal request with GTC expiry and no comment.
    pub fn market(
        symbol: impl Into<String>,
        direction: Direction,
        volume: Decimal,
        price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            volume,
            price,
            stop_loss: 0.0,
            take_profit: 0.0,
            deviation: 20,
            comment: String::new(),
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// Attach protective levels.
    pub fn with_levels(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn with_deviation(mut self, deviation: u32) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Confirmation of a filled deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: Decimal,
    /// Fill price
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Outcome category reported to the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Executed,
    Adjusted,
    Hold,
    Error,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Executed => write!(f, "executed"),
            ExecutionStatus::Adjusted => write!(f, "adjusted"),
            ExecutionStatus::Hold => write!(f, "hold"),
            ExecutionStatus::Error => write!(f, "error"),
        }
    }
}

/// What the execution side did with one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp: Option<f64>,
    /// Realized profit, when the result closes something
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    fn bare(status: ExecutionStatus, symbol: &str) -> Self {
        Self {
            status,
            symbol: symbol.to_string(),
            ticket: None,
            volume: None,
            price: None,
            sl: None,
            tp: None,
            profit: None,
            error: None,
        }
    }

    pub fn hold(symbol: &str) -> Self {
        Self::bare(ExecutionStatus::Hold, symbol)
    }

    pub fn error(symbol: &str, error: impl fmt::Display) -> Self {
        let mut result = Self::bare(ExecutionStatus::Error, symbol);
        result.error = Some(error.to_string());
        result
    }

    pub fn executed(receipt: &OrderReceipt) -> Self {
        let mut result = Self::bare(ExecutionStatus::Executed, &receipt.symbol);
        result.ticket = Some(receipt.ticket);
        result.volume = Some(receipt.volume);
        result.price = Some(receipt.price);
        result.sl = Some(receipt.stop_loss);
        result.tp = Some(receipt.take_profit);
        result
    }

    pub fn adjusted(symbol: &str, ticket: u64, sl: f64, tp: f64) -> Self {
        let mut result = Self::bare(ExecutionStatus::Adjusted, symbol);
        result.ticket = Some(ticket);
        result.sl = Some(sl);
        result.tp = Some(tp);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_request_builder() {
        let req = OrderRequest::market("EURUSD", Direction::Long, dec!(0.25), 1.1052)
            .with_levels(1.1032, 1.1082)
            .with_comment("AI Trade");

        assert_eq!(req.deviation, 20);
        assert_eq!(req.time_in_force, TimeInForce::Gtc);
        assert_eq!(req.stop_loss, 1.1032);
        assert_eq!(req.comment, "AI Trade");
    }

    #[test]
    fn test_result_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ExecutionResult::hold("EURUSD")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "hold", "symbol": "EURUSD"}));

        let err = serde_json::to_value(ExecutionResult::error("XAUUSD", "Order rejected")).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"], "Order rejected");
    }
}
