//! Strategy trait definitions.

use crate::error::{SnapshotError, TradingError};
use crate::types::{Direction, IndicatorSnapshot};
use serde::{Deserialize, Serialize};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), TradingError>;
}

/// A rule firing on a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSignal {
    pub direction: Direction,
    pub confidence: f64,
    /// ATR multiple used for stop-loss and take-profit distance
    pub risk_multiplier: f64,
    pub reasoning: String,
}

/// Core strategy trait.
///
/// A strategy inspects one immutable snapshot and either fires a signal or
/// stays silent. Strategies hold no state between calls, so the same
/// instance can be shared across symbols and threads.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Evaluate a snapshot.
    ///
    /// # Returns
    /// * `Ok(Some(signal))` when the rule fires
    /// * `Ok(None)` when it does not
    /// * `Err(_)` when an indicator it needs is missing or non-numeric
    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<Option<RuleSignal>, SnapshotError>;

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::names;

    struct RsiAbove {
        level: f64,
    }

    impl Strategy for RsiAbove {
        fn name(&self) -> &str {
            "rsi_above"
        }

        fn evaluate(
            &self,
            snapshot: &IndicatorSnapshot,
        ) -> Result<Option<RuleSignal>, SnapshotError> {
            let rsi = snapshot.indicator(names::RSI)?;
            Ok((rsi > self.level).then(|| RuleSignal {
                direction: Direction::Long,
                confidence: 0.5,
                risk_multiplier: 1.0,
                reasoning: format!("rsi {:.1} above {}", rsi, self.level),
            }))
        }
    }

    #[test]
    fn test_strategy_evaluation() {
        let strategy = RsiAbove { level: 60.0 };
        let hot = IndicatorSnapshot::new("EURUSD", 0, 1.1, 100).with(names::RSI, 65.0);
        let cold = IndicatorSnapshot::new("EURUSD", 0, 1.1, 100).with(names::RSI, 40.0);
        let empty = IndicatorSnapshot::new("EURUSD", 0, 1.1, 100);

        assert!(strategy.evaluate(&hot).unwrap().is_some());
        assert!(strategy.evaluate(&cold).unwrap().is_none());
        assert!(strategy.evaluate(&empty).is_err());
    }
}
