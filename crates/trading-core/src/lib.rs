//! Core types and traits for the trading system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Quote, SymbolInfo)
//! - Indicator snapshots and trade decisions
//! - Order requests and execution results
//! - Core traits for decision providers, strategies, terminals, and data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
