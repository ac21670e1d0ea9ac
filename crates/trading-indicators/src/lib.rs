//! Indicator snapshots for the decision engine.
//!
//! Candles are streamed through the `ta` crate's EMA, RSI, ATR, Bollinger
//! Bands and MACD, plus an ADX implemented on the same `Next`/`Reset`
//! traits. Each step yields an [`IndicatorSnapshot`](trading_core::IndicatorSnapshot).

pub mod adx;
pub mod snapshot;

pub use adx::AverageDirectionalIndex;
pub use snapshot::{SnapshotBuilder, SnapshotConfig};
