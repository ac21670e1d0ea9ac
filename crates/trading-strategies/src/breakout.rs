//! Volatility breakout: ATR expanding past its own rolling mean.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{SnapshotError, TradingError},
    names,
    traits::{RuleSignal, Strategy, StrategyConfig},
    Direction, IndicatorSnapshot,
};

use crate::trend_following::validate_signal_params;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// ATR must exceed this multiple of its rolling mean
    pub atr_multiple: f64,
    pub rsi_midpoint: f64,
    pub confidence: f64,
    pub risk_multiplier: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            atr_multiple: 1.5,
            rsi_midpoint: 50.0,
            confidence: 0.8,
            risk_multiplier: 2.0,
        }
    }
}

impl StrategyConfig for BreakoutConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if !(self.atr_multiple > 0.0 && self.atr_multiple.is_finite()) {
            return Err(TradingError::Config("ATR multiple must be positive".into()));
        }
        if !(0.0..=100.0).contains(&self.rsi_midpoint) {
            return Err(TradingError::Config(
                "RSI midpoint must be between 0 and 100".into(),
            ));
        }
        validate_signal_params("breakout", self.confidence, self.risk_multiplier)
    }
}

/// Fires when volatility expands; RSI above the midpoint buys, below sells,
/// exactly on it stays silent.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    config: BreakoutConfig,
}

impl BreakoutStrategy {
    pub fn new(config: BreakoutConfig) -> Self {
        Self { config }
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<Option<RuleSignal>, SnapshotError> {
        let atr = snapshot.indicator(names::ATR)?;
        let atr_mean = snapshot.indicator(names::ATR_MEAN)?;
        let rsi = snapshot.indicator(names::RSI)?;

        if atr <= self.config.atr_multiple * atr_mean {
            return Ok(None);
        }

        let direction = if rsi > self.config.rsi_midpoint {
            Direction::Long
        } else if rsi < self.config.rsi_midpoint {
            Direction::Short
        } else {
            return Ok(None);
        };

        Ok(Some(RuleSignal {
            direction,
            confidence: self.config.confidence,
            risk_multiplier: self.config.risk_multiplier,
            reasoning: format!(
                "volatility breakout: ATR {:.5} vs mean {:.5}, RSI {:.1}",
                atr, atr_mean, rsi
            ),
        }))
    }

    fn description(&self) -> &str {
        "Trades volatility expansion in the direction of RSI momentum"
    }
}
