//! Risk management for trading.
//!
//! Provides ATR protective levels, risk/reward measurement and lot sizing.

mod levels;
mod position_sizer;

pub use levels::{protective_levels, risk_reward};
pub use position_sizer::{LotSizer, LotSizerConfig};
