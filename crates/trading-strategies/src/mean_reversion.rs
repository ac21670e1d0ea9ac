//! Mean Reversion Strategy using Bollinger Bands.
//!
//! Buys when price touches the lower band with RSI oversold,
//! sells when price touches the upper band with RSI overbought.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{SnapshotError, TradingError},
    names,
    traits::{RuleSignal, Strategy, StrategyConfig},
    Direction, IndicatorSnapshot,
};

use crate::trend_following::validate_signal_params;

/// Configuration for the Mean Reversion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    /// RSI below this is oversold
    pub oversold: f64,
    /// RSI above this is overbought
    pub overbought: f64,
    pub confidence: f64,
    pub risk_multiplier: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            confidence: 0.75,
            risk_multiplier: 1.0,
        }
    }
}

impl StrategyConfig for MeanReversionConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if !(0.0..=100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err(TradingError::Config(
                "RSI levels must be between 0 and 100".into(),
            ));
        }
        if self.oversold >= self.overbought {
            return Err(TradingError::Config(
                "Oversold level must be below overbought level".into(),
            ));
        }
        validate_signal_params("mean_reversion", self.confidence, self.risk_multiplier)
    }
}

/// Mean Reversion Strategy using Bollinger Bands.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
}

impl MeanReversionStrategy {
    /// Create a new Mean Reversion strategy.
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<Option<RuleSignal>, SnapshotError> {
        let close = snapshot.price()?;
        let upper = snapshot.indicator(names::BOLLINGER_UPPER)?;
        let lower = snapshot.indicator(names::BOLLINGER_LOWER)?;
        let rsi = snapshot.indicator(names::RSI)?;

        let (direction, reasoning) = if close <= lower && rsi < self.config.oversold {
            (
                Direction::Long,
                format!("price {:.5} at lower band {:.5}, RSI {:.1} oversold", close, lower, rsi),
            )
        } else if close >= upper && rsi > self.config.overbought {
            (
                Direction::Short,
                format!("price {:.5} at upper band {:.5}, RSI {:.1} overbought", close, upper, rsi),
            )
        } else {
            return Ok(None);
        };

        Ok(Some(RuleSignal {
            direction,
            confidence: self.config.confidence,
            risk_multiplier: self.config.risk_multiplier,
            reasoning,
        }))
    }

    fn description(&self) -> &str {
        "Fades Bollinger Band extremes when RSI is oversold or overbought"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(close: f64, rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot::new("EURUSD", 0, close, 500)
            .with(names::BOLLINGER_UPPER, 1.1100)
            .with(names::BOLLINGER_LOWER, 1.0900)
            .with(names::RSI, rsi)
    }

    #[test]
    fn test_oversold_touch_buys() {
        let strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let signal = strategy.evaluate(&snapshot(1.0900, 25.0)).unwrap().unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.confidence, 0.75);
        assert_eq!(signal.risk_multiplier, 1.0);
    }

    #[test]
    fn test_overbought_touch_sells() {
        let strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        let signal = strategy.evaluate(&snapshot(1.1120, 75.0)).unwrap().unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn test_needs_both_band_and_rsi() {
        let strategy = MeanReversionStrategy::new(MeanReversionConfig::default());
        assert!(strategy.evaluate(&snapshot(1.0890, 35.0)).unwrap().is_none());
        assert!(strategy.evaluate(&snapshot(1.1000, 20.0)).unwrap().is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(MeanReversionConfig::default().validate().is_ok());
        let inverted = MeanReversionConfig {
            oversold: 70.0,
            overbought: 30.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
