//! The rule-based decision engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trading_core::{
    error::TradingError,
    names,
    traits::{Strategy, StrategyConfig},
    IndicatorSnapshot, OpenPosition, TradeDecision, TradeIntent,
};
use trading_risk::protective_levels;

use crate::{
    BreakoutConfig, BreakoutStrategy, DecisionValidator, MeanReversionConfig,
    MeanReversionStrategy, TrendFollowingConfig, TrendFollowingStrategy,
};

/// Engine configuration: warm-up requirement plus per-rule thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bars a snapshot needs behind it before rules are evaluated
    pub min_bars: usize,
    pub trend_following: TrendFollowingConfig,
    pub mean_reversion: MeanReversionConfig,
    pub breakout: BreakoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: 50,
            trend_following: TrendFollowingConfig::default(),
            mean_reversion: MeanReversionConfig::default(),
            breakout: BreakoutConfig::default(),
        }
    }
}

impl StrategyConfig for EngineConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.min_bars == 0 {
            return Err(TradingError::Config("min_bars must be at least 1".into()));
        }
        self.trend_following.validate()?;
        self.mean_reversion.validate()?;
        self.breakout.validate()
    }
}

/// Maps a snapshot to exactly one decision.
///
/// Rules run in priority order (trend-following, mean-reversion, breakout)
/// and the first to fire wins. The engine is immutable after construction,
/// so one instance can be shared across symbol workers behind an `Arc`.
pub struct DecisionEngine {
    config: EngineConfig,
    strategies: Vec<Box<dyn Strategy>>,
    validator: DecisionValidator,
}

impl DecisionEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, TradingError> {
        config.validate()?;
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(TrendFollowingStrategy::new(config.trend_following.clone())),
            Box::new(MeanReversionStrategy::new(config.mean_reversion.clone())),
            Box::new(BreakoutStrategy::new(config.breakout.clone())),
        ];
        Ok(Self {
            config,
            strategies,
            validator: DecisionValidator::structural(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rules in evaluation order.
    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    /// Decide for one snapshot. Never fails: missing or non-numeric
    /// indicators and invalid levels turn into the safe fallback with the
    /// cause appended to its reasoning.
    ///
    /// The open position does not influence the rules; callers use it to
    /// turn the decision into an adjustment via [`DecisionEngine::decide_intent`].
    pub fn decide(&self, snapshot: &IndicatorSnapshot, position: Option<&OpenPosition>) -> TradeDecision {
        if let Some(pos) = position {
            debug!(symbol = %snapshot.symbol, ticket = pos.ticket, direction = %pos.direction, "Deciding with open position");
        }
        match self.evaluate(snapshot) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(symbol = %snapshot.symbol, error = %e, "Decision fell back to hold");
                TradeDecision::fallback_with(e)
            }
        }
    }

    /// Decide and resolve what to do with an open position.
    pub fn decide_intent(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> TradeIntent {
        let decision = self.decide(snapshot, position);
        self.validator
            .resolve_intent(decision, position, snapshot.close)
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<TradeDecision, TradingError> {
        if snapshot.bars < self.config.min_bars {
            debug!(
                symbol = %snapshot.symbol,
                bars = snapshot.bars,
                required = self.config.min_bars,
                "Not enough bars"
            );
            return Ok(TradeDecision::insufficient_data());
        }

        let price = snapshot.price()?;

        for strategy in &self.strategies {
            let Some(signal) = strategy.evaluate(snapshot)? else {
                continue;
            };

            let atr = snapshot.indicator(names::ATR)?;
            let (stop_loss, take_profit) =
                protective_levels(price, atr, signal.risk_multiplier, signal.direction);
            let decision = TradeDecision::directional(
                signal.direction.action(),
                stop_loss,
                take_profit,
                signal.confidence,
                format!("{}: {}", strategy.name(), signal.reasoning),
            );

            debug!(
                symbol = %snapshot.symbol,
                strategy = strategy.name(),
                action = %decision.action,
                stop_loss,
                take_profit,
                "Strategy fired"
            );
            return Ok(self.validator.validate(decision, price)?);
        }

        Ok(TradeDecision::no_signal())
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("config", &self.config)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
