//! Trade-level checks every decision passes before anyone acts on it.

use tracing::warn;
use trading_core::{
    error::ValidationError, OpenPosition, PositionAdjustment, TradeAction, TradeDecision,
    TradeIntent,
};

/// Checks confidence range, level sign and ordering, and optionally a
/// minimum risk/reward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionValidator {
    min_risk_reward: Option<f64>,
}

impl DecisionValidator {
    /// Structural checks only.
    pub fn structural() -> Self {
        Self::default()
    }

    /// Structural checks plus a risk/reward floor.
    pub fn with_min_risk_reward(min_risk_reward: f64) -> Self {
        Self {
            min_risk_reward: Some(min_risk_reward),
        }
    }

    pub fn min_risk_reward(&self) -> Option<f64> {
        self.min_risk_reward
    }

    /// Validate `decision` against the reference `price`.
    ///
    /// Holds pass with their levels zeroed.
    pub fn validate(
        &self,
        mut decision: TradeDecision,
        price: f64,
    ) -> Result<TradeDecision, ValidationError> {
        if !(0.0..=1.0).contains(&decision.confidence) {
            return Err(ValidationError::Confidence(decision.confidence));
        }

        let (sl, tp) = (decision.stop_loss, decision.take_profit);
        match decision.action {
            TradeAction::Hold => {
                decision.stop_loss = 0.0;
                decision.take_profit = 0.0;
                return Ok(decision);
            }
            _ if !(sl > 0.0 && tp > 0.0 && sl.is_finite() && tp.is_finite()) => {
                return Err(ValidationError::NonPositiveLevels {
                    stop_loss: sl,
                    take_profit: tp,
                });
            }
            TradeAction::Buy if !(sl < price && price < tp) => {
                return Err(self.level_order(&decision, price));
            }
            TradeAction::Sell if !(tp < price && price < sl) => {
                return Err(self.level_order(&decision, price));
            }
            _ => {}
        }

        if let Some(minimum) = self.min_risk_reward {
            // ordering above guarantees a non-zero risk
            let ratio = decision.risk_reward(price).unwrap_or(0.0);
            if ratio < minimum {
                return Err(ValidationError::RiskReward { ratio, minimum });
            }
        }

        Ok(decision)
    }

    /// Validate new levels for an open position with the same rules as a
    /// fresh entry in the position's direction.
    pub fn validate_adjustment(
        &self,
        adjustment: &PositionAdjustment,
        position: &OpenPosition,
        price: f64,
    ) -> Result<(), ValidationError> {
        if adjustment.symbol != position.symbol || adjustment.ticket != position.ticket {
            return Err(ValidationError::SymbolMismatch {
                expected: format!("{}#{}", position.symbol, position.ticket),
                actual: format!("{}#{}", adjustment.symbol, adjustment.ticket),
            });
        }
        let as_entry = TradeDecision::directional(
            position.direction.action(),
            adjustment.stop_loss,
            adjustment.take_profit,
            1.0,
            "adjustment",
        );
        self.validate(as_entry, price)?;
        Ok(())
    }

    /// Resolve what to do with `decision` given the open position. An
    /// adjustment goes through [`DecisionValidator::validate_adjustment`];
    /// if it fails the intent stands on the fallback.
    pub fn resolve_intent(
        &self,
        decision: TradeDecision,
        position: Option<&OpenPosition>,
        price: f64,
    ) -> TradeIntent {
        let intent = TradeIntent::resolve(decision, position);
        let (TradeIntent::Adjust { adjustment, .. }, Some(pos)) = (&intent, position) else {
            return intent;
        };
        match self.validate_adjustment(adjustment, pos, price) {
            Ok(()) => intent,
            Err(e) => {
                warn!(symbol = %pos.symbol, ticket = pos.ticket, error = %e, "Rejected position adjustment");
                TradeIntent::Stand(TradeDecision::fallback_with(e))
            }
        }
    }

    fn level_order(&self, decision: &TradeDecision, price: f64) -> ValidationError {
        ValidationError::LevelOrder {
            action: decision.action,
            stop_loss: decision.stop_loss,
            price,
            take_profit: decision.take_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::Direction;

    fn buy(sl: f64, tp: f64) -> TradeDecision {
        TradeDecision::directional(TradeAction::Buy, sl, tp, 0.8, "test")
    }

    #[test]
    fn test_valid_buy_and_sell() {
        let v = DecisionValidator::structural();
        assert!(v.validate(buy(1.0990, 1.1010), 1.1000).is_ok());

        let sell = TradeDecision::directional(TradeAction::Sell, 1.1010, 1.0990, 0.8, "test");
        assert!(v.validate(sell, 1.1000).is_ok());
    }

    #[test]
    fn test_level_ordering() {
        let v = DecisionValidator::structural();
        assert!(matches!(
            v.validate(buy(1.1010, 1.0990), 1.1000),
            Err(ValidationError::LevelOrder { .. })
        ));

        let sell = TradeDecision::directional(TradeAction::Sell, 1.0990, 1.1010, 0.8, "test");
        assert!(matches!(
            v.validate(sell, 1.1000),
            Err(ValidationError::LevelOrder { .. })
        ));
    }

    #[test]
    fn test_non_positive_levels() {
        let v = DecisionValidator::structural();
        assert!(matches!(
            v.validate(buy(0.0, 1.1010), 1.1000),
            Err(ValidationError::NonPositiveLevels { .. })
        ));
        assert!(matches!(
            v.validate(buy(f64::NAN, 1.1010), 1.1000),
            Err(ValidationError::NonPositiveLevels { .. })
        ));
    }

    #[test]
    fn test_confidence_range() {
        let v = DecisionValidator::structural();
        let mut d = buy(1.0990, 1.1010);
        d.confidence = 1.01;
        assert_eq!(v.validate(d, 1.1), Err(ValidationError::Confidence(1.01)));
    }

    #[test]
    fn test_hold_normalised() {
        let v = DecisionValidator::with_min_risk_reward(1.5);
        let hold = TradeDecision {
            action: TradeAction::Hold,
            stop_loss: 1.09,
            take_profit: 1.12,
            confidence: 0.3,
            reasoning: "wait".into(),
        };
        let out = v.validate(hold, 1.1).unwrap();
        assert_eq!(out.stop_loss, 0.0);
        assert_eq!(out.take_profit, 0.0);
        assert_eq!(out.confidence, 0.3);
    }

    #[test]
    fn test_risk_reward_floor() {
        let v = DecisionValidator::with_min_risk_reward(1.5);
        // risk 10 pips, reward 10 pips
        assert!(matches!(
            v.validate(buy(1.0990, 1.1010), 1.1000),
            Err(ValidationError::RiskReward { .. })
        ));
        // risk 10 pips, reward 20 pips
        assert!(v.validate(buy(1.0990, 1.1020), 1.1000).is_ok());
    }

    #[test]
    fn test_adjustment_uses_position_direction() {
        let v = DecisionValidator::structural();
        let position = OpenPosition {
            ticket: 42,
            symbol: "EURUSD".into(),
            direction: Direction::Short,
            volume: 0.1,
            open_price: 1.1050,
            stop_loss: 1.1100,
            take_profit: 1.1000,
        };
        let mut adjustment = PositionAdjustment {
            ticket: 42,
            symbol: "EURUSD".into(),
            direction: Direction::Short,
            stop_loss: 1.1080,
            take_profit: 1.1010,
        };
        assert!(v.validate_adjustment(&adjustment, &position, 1.1040).is_ok());

        // long-style levels on a short position
        adjustment.stop_loss = 1.1010;
        adjustment.take_profit = 1.1080;
        assert!(v.validate_adjustment(&adjustment, &position, 1.1040).is_err());

        adjustment.ticket = 7;
        assert!(matches!(
            v.validate_adjustment(&adjustment, &position, 1.1040),
            Err(ValidationError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn test_resolve_intent_rejects_bad_adjustment() {
        let v = DecisionValidator::structural();
        let position = OpenPosition {
            ticket: 9,
            symbol: "EURUSD".into(),
            direction: Direction::Long,
            volume: 0.1,
            open_price: 1.0980,
            stop_loss: 1.0950,
            take_profit: 1.1050,
        };

        let moved = v.resolve_intent(buy(1.0990, 1.1030), Some(&position), 1.1000);
        assert!(matches!(moved, TradeIntent::Adjust { .. }));

        // stop above the current price
        let inverted = v.resolve_intent(buy(1.1010, 1.1030), Some(&position), 1.1000);
        match inverted {
            TradeIntent::Stand(d) => {
                assert_eq!(d.action, TradeAction::Hold);
                assert!(d.reasoning.starts_with(trading_core::FALLBACK_REASONING));
            }
            other => panic!("expected stand, got {:?}", other),
        }

        assert!(matches!(
            v.resolve_intent(buy(1.1010, 1.1030), None, 1.1000),
            TradeIntent::Open(_)
        ));
    }
}
