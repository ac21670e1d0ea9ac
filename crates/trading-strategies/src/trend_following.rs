//! Trend-following: moving-average stack confirmed by ADX and RSI.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{SnapshotError, TradingError},
    names,
    traits::{RuleSignal, Strategy, StrategyConfig},
    Direction, IndicatorSnapshot,
};

/// Configuration for the trend-following rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFollowingConfig {
    /// ADX level above which a trend counts as strong
    pub adx_threshold: f64,
    /// RSI level separating bullish from bearish momentum
    pub rsi_midpoint: f64,
    pub confidence: f64,
    pub risk_multiplier: f64,
}

impl Default for TrendFollowingConfig {
    fn default() -> Self {
        Self {
            adx_threshold: 25.0,
            rsi_midpoint: 50.0,
            confidence: 0.85,
            risk_multiplier: 1.5,
        }
    }
}

impl StrategyConfig for TrendFollowingConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if !(0.0..=100.0).contains(&self.adx_threshold) {
            return Err(TradingError::Config(
                "ADX threshold must be between 0 and 100".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.rsi_midpoint) {
            return Err(TradingError::Config(
                "RSI midpoint must be between 0 and 100".into(),
            ));
        }
        validate_signal_params("trend_following", self.confidence, self.risk_multiplier)
    }
}

/// Shared bounds for a rule's fixed confidence and ATR multiple.
pub(crate) fn validate_signal_params(
    rule: &str,
    confidence: f64,
    risk_multiplier: f64,
) -> Result<(), TradingError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(TradingError::Config(format!(
            "{} confidence must be between 0 and 1",
            rule
        )));
    }
    if !(risk_multiplier > 0.0 && risk_multiplier.is_finite()) {
        return Err(TradingError::Config(format!(
            "{} risk multiplier must be positive",
            rule
        )));
    }
    Ok(())
}

/// Buys when `ema_fast > ema_slow`, ADX is above the threshold and RSI is
/// above its midpoint; sells on the mirror image.
#[derive(Debug, Clone)]
pub struct TrendFollowingStrategy {
    config: TrendFollowingConfig,
}

impl TrendFollowingStrategy {
    pub fn new(config: TrendFollowingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for TrendFollowingStrategy {
    fn name(&self) -> &str {
        "trend_following"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<Option<RuleSignal>, SnapshotError> {
        let fast = snapshot.indicator(names::EMA_FAST)?;
        let slow = snapshot.indicator(names::EMA_SLOW)?;
        let adx = snapshot.indicator(names::ADX)?;
        let rsi = snapshot.indicator(names::RSI)?;

        if adx <= self.config.adx_threshold {
            return Ok(None);
        }

        let direction = if fast > slow && rsi > self.config.rsi_midpoint {
            Direction::Long
        } else if fast < slow && rsi < self.config.rsi_midpoint {
            Direction::Short
        } else {
            return Ok(None);
        };

        Ok(Some(RuleSignal {
            direction,
            confidence: self.config.confidence,
            risk_multiplier: self.config.risk_multiplier,
            reasoning: format!(
                "{} trend: EMA {:.5}/{:.5}, ADX {:.1}, RSI {:.1}",
                if direction == Direction::Long { "bullish" } else { "bearish" },
                fast,
                slow,
                adx,
                rsi
            ),
        }))
    }

    fn description(&self) -> &str {
        "Follows strong trends: EMA stack confirmed by ADX strength and RSI momentum"
    }
}
