//! Trade decisions and the open-position context they are applied to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Reasoning attached to the canonical safe fallback.
pub const FALLBACK_REASONING: &str = "system error - conservative hold";
/// Reasoning when too few bars back a snapshot.
pub const INSUFFICIENT_DATA_REASONING: &str = "insufficient data";
/// Reasoning when no strategy fires.
pub const NO_SIGNAL_REASONING: &str = "no clear signal";

/// What to do with an instrument this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Position direction a directional action opens.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TradeAction::Buy => Some(Direction::Long),
            TradeAction::Sell => Some(Direction::Short),
            TradeAction::Hold => None,
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, TradeAction::Hold)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

impl FromStr for TradeAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            "hold" => Ok(TradeAction::Hold),
            _ => Err(ValidationError::InvalidAction(s.to_string())),
        }
    }
}

/// Side of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    /// Action that opens a position in this direction.
    pub fn action(&self) -> TradeAction {
        match self {
            Direction::Long => TradeAction::Buy,
            Direction::Short => TradeAction::Sell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// One cycle's verdict for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: TradeAction,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: f64,
    pub reasoning: String,
}

impl TradeDecision {
    /// A directional decision with explicit levels.
    pub fn directional(
        action: TradeAction,
        stop_loss: f64,
        take_profit: f64,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action,
            stop_loss,
            take_profit,
            confidence,
            reasoning: reasoning.into(),
        }
    }

    /// A hold with zero levels.
    pub fn hold(confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            stop_loss: 0.0,
            take_profit: 0.0,
            confidence,
            reasoning: reasoning.into(),
        }
    }

    /// The canonical safe fallback.
    pub fn fallback() -> Self {
        Self::hold(0.0, FALLBACK_REASONING)
    }

    /// Safe fallback carrying a diagnostic.
    pub fn fallback_with(diagnostic: impl fmt::Display) -> Self {
        Self::hold(0.0, format!("{} ({})", FALLBACK_REASONING, diagnostic))
    }

    pub fn insufficient_data() -> Self {
        Self::hold(0.0, INSUFFICIENT_DATA_REASONING)
    }

    pub fn no_signal() -> Self {
        Self::hold(0.5, NO_SIGNAL_REASONING)
    }

    pub fn is_hold(&self) -> bool {
        self.action == TradeAction::Hold
    }

    /// Reward over risk measured from `price`; `None` when risk is zero.
    pub fn risk_reward(&self, price: f64) -> Option<f64> {
        let risk = (self.stop_loss - price).abs();
        let reward = (self.take_profit - price).abs();
        (risk > 0.0).then(|| reward / risk)
    }

    /// Round levels to 5 decimals and confidence to 2, as terminal prices
    /// for FX pairs are quoted.
    pub fn rounded(mut self) -> Self {
        self.stop_loss = round_to(self.stop_loss, 5);
        self.take_profit = round_to(self.take_profit, 5);
        self.confidence = round_to(self.confidence, 2);
        self
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// A position held at the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// New protective levels for an existing position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAdjustment {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// What the execution side should do with a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeIntent {
    /// Open a new position.
    Open(TradeDecision),
    /// Move SL/TP on a position already open in the decided direction.
    Adjust {
        adjustment: PositionAdjustment,
        decision: TradeDecision,
    },
    /// Nothing to send.
    Stand(TradeDecision),
}

impl TradeIntent {
    /// Directional decision + same-direction position → adjustment; any
    /// other directional decision opens; holds stand.
    pub fn resolve(decision: TradeDecision, position: Option<&OpenPosition>) -> Self {
        let Some(direction) = decision.action.direction() else {
            return TradeIntent::Stand(decision);
        };
        match position {
            Some(pos) if pos.direction == direction => TradeIntent::Adjust {
                adjustment: PositionAdjustment {
                    ticket: pos.ticket,
                    symbol: pos.symbol.clone(),
                    direction,
                    stop_loss: decision.stop_loss,
                    take_profit: decision.take_profit,
                },
                decision,
            },
            _ => TradeIntent::Open(decision),
        }
    }

    pub fn decision(&self) -> &TradeDecision {
        match self {
            TradeIntent::Open(d) | TradeIntent::Stand(d) => d,
            TradeIntent::Adjust { decision, .. } => decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(direction: Direction) -> OpenPosition {
        OpenPosition {
            ticket: 7,
            symbol: "EURUSD".into(),
            direction,
            volume: 0.1,
            open_price: 1.1000,
            stop_loss: 1.0950,
            take_profit: 1.1100,
        }
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("BUY".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!(" hold ".parse::<TradeAction>().unwrap(), TradeAction::Hold);
        assert_eq!(
            "short".parse::<TradeAction>(),
            Err(ValidationError::InvalidAction("short".into()))
        );
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_string(&TradeAction::Sell).unwrap();
        assert_eq!(json, "\"sell\"");
        assert!(serde_json::from_str::<TradeAction>("\"close\"").is_err());
    }

    #[test]
    fn test_fallback_shape() {
        let d = TradeDecision::fallback();
        assert_eq!(d.action, TradeAction::Hold);
        assert_eq!(d.stop_loss, 0.0);
        assert_eq!(d.take_profit, 0.0);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.reasoning, FALLBACK_REASONING);

        let diag = TradeDecision::fallback_with("missing indicator: adx");
        assert!(diag.reasoning.starts_with(FALLBACK_REASONING));
        assert!(diag.reasoning.contains("adx"));
    }

    #[test]
    fn test_risk_reward() {
        let d = TradeDecision::directional(TradeAction::Buy, 1.0990, 1.1030, 0.7, "");
        let rr = d.risk_reward(1.1000).unwrap();
        assert!((rr - 3.0).abs() < 1e-6);

        let flat = TradeDecision::directional(TradeAction::Buy, 1.1, 1.2, 0.7, "");
        assert!(flat.risk_reward(1.1).is_none());
    }

    #[test]
    fn test_rounding() {
        let d = TradeDecision::directional(TradeAction::Buy, 1.103_204_9, 1.106_795_1, 0.856, "")
            .rounded();
        assert_eq!(d.stop_loss, 1.10320);
        assert_eq!(d.take_profit, 1.10680);
        assert_eq!(d.confidence, 0.86);
    }

    #[test]
    fn test_intent_resolution() {
        let buy = TradeDecision::directional(TradeAction::Buy, 1.09, 1.12, 0.85, "trend");

        let long = position(Direction::Long);
        match TradeIntent::resolve(buy.clone(), Some(&long)) {
            TradeIntent::Adjust { adjustment, .. } => {
                assert_eq!(adjustment.ticket, 7);
                assert_eq!(adjustment.stop_loss, 1.09);
            }
            other => panic!("expected adjustment, got {:?}", other),
        }

        let short = position(Direction::Short);
        assert!(matches!(
            TradeIntent::resolve(buy.clone(), Some(&short)),
            TradeIntent::Open(_)
        ));
        assert!(matches!(TradeIntent::resolve(buy, None), TradeIntent::Open(_)));
        assert!(matches!(
            TradeIntent::resolve(TradeDecision::no_signal(), Some(&long)),
            TradeIntent::Stand(_)
        ));
    }
}
