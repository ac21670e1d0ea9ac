//! Error types for the trading system.

use thiserror::Error;

use crate::types::TradeAction;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Decision provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Problems reading an indicator snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("missing indicator: {0}")]
    MissingIndicator(String),

    #[error("non-numeric value for {name}: {value}")]
    NonNumeric { name: String, value: f64 },

    #[error("non-numeric close price: {0}")]
    InvalidPrice(f64),

    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientBars { required: usize, available: usize },
}

/// A decision that breaks the trade-level contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid trading action: {0}")]
    InvalidAction(String),

    #[error("confidence must be between 0 and 1, got {0}")]
    Confidence(f64),

    #[error("positive price levels required for active trades (sl={stop_loss}, tp={take_profit})")]
    NonPositiveLevels { stop_loss: f64, take_profit: f64 },

    #[error("invalid levels for {action}: sl={stop_loss} price={price} tp={take_profit}")]
    LevelOrder {
        action: TradeAction,
        stop_loss: f64,
        price: f64,
        take_profit: f64,
    },

    #[error("risk/reward {ratio:.2}:1 below minimum {minimum}:1")]
    RiskReward { ratio: f64, minimum: f64 },

    #[error("adjustment targets {expected} but position is {actual}")]
    SymbolMismatch { expected: String, actual: String },
}

/// Errors raised by a decision provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("decision rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("snapshot unusable: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Terminal / broker errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Symbol unavailable: {0}")]
    SymbolUnavailable(String),

    #[error("Price data unavailable for {0}")]
    NoQuote(String),

    #[error("Position not found: {0}")]
    PositionNotFound(u64),

    #[error("Price moved beyond deviation: requested {requested}, market {market}")]
    Requote { requested: f64, market: f64 },

    #[error("Invalid symbol property: {0}")]
    InvalidSymbolInfo(String),

    #[error("Internal broker error: {0}")]
    Internal(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for {0}")]
    NoDataAvailable(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid bar at {timestamp}: {reason}")]
    InvalidBar { timestamp: i64, reason: String },
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
