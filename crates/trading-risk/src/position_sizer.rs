//! Lot sizing from account risk.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::BrokerError;
use trading_core::SymbolInfo;

/// Risk parameters for sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizerConfig {
    /// Percentage of balance risked per trade
    pub risk_percent: Decimal,
    /// Smallest lot the sizer will return
    pub min_lot: Decimal,
}

impl Default for LotSizerConfig {
    fn default() -> Self {
        Self {
            risk_percent: dec!(1.0),
            min_lot: dec!(0.01),
        }
    }
}

/// Sizes a deal so that hitting the stop-loss costs `risk_percent` of the
/// balance.
#[derive(Debug, Clone)]
pub struct LotSizer {
    config: LotSizerConfig,
}

impl LotSizer {
    pub fn new(config: LotSizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LotSizerConfig {
        &self.config
    }

    /// Calculate lots for a deal entered at `entry` with its stop at
    /// `stop_loss`.
    ///
    /// The result is floored to 0.01 lots and kept within
    /// `[min_lot, volume_max]`. A zero stop distance returns the minimum lot.
    pub fn calculate(
        &self,
        balance: Decimal,
        entry: f64,
        stop_loss: f64,
        symbol: &SymbolInfo,
    ) -> Result<Decimal, BrokerError> {
        if symbol.point <= 0.0 {
            return Err(BrokerError::InvalidSymbolInfo(format!(
                "{} point {} must be positive",
                symbol.symbol, symbol.point
            )));
        }
        if symbol.trade_tick_value <= Decimal::ZERO {
            return Err(BrokerError::InvalidSymbolInfo(format!(
                "{} tick value {} must be positive",
                symbol.symbol, symbol.trade_tick_value
            )));
        }

        let min_lot = self.config.min_lot.max(symbol.volume_min);
        let max_lot = symbol.volume_max.max(min_lot);

        let ticks = (entry - stop_loss).abs() / symbol.point;
        let ticks = match Decimal::from_f64(ticks) {
            Some(t) if t > Decimal::ZERO => t,
            _ => return Ok(min_lot),
        };

        let risk_amount = balance * self.config.risk_percent / dec!(100);
        let lots = (risk_amount / (ticks * symbol.trade_tick_value))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);

        debug!(
            symbol = %symbol.symbol,
            %risk_amount,
            %ticks,
            %lots,
            "Calculated lot size"
        );

        Ok(lots.max(min_lot).min(max_lot))
    }
}

impl Default for LotSizer {
    fn default() -> Self {
        Self::new(LotSizerConfig::default())
    }
}
