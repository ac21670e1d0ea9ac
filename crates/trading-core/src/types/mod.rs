//! Core data types for the trading system.

mod decision;
mod market;
mod ohlcv;
mod order;
mod snapshot;
mod timeframe;

pub use decision::{
    Direction, OpenPosition, PositionAdjustment, TradeAction, TradeDecision, TradeIntent,
    FALLBACK_REASONING, INSUFFICIENT_DATA_REASONING, NO_SIGNAL_REASONING,
};
pub use market::{AccountInfo, ClosedDeal, Quote, SymbolInfo, TerminalInfo};
pub use ohlcv::Bar;
pub use order::{ExecutionResult, ExecutionStatus, OrderReceipt, OrderRequest, TimeInForce};
pub use snapshot::{names, IndicatorSnapshot, Trend};
pub use timeframe::Timeframe;
