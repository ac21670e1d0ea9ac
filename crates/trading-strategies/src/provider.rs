//! The rule engine exposed as a decision provider.

use async_trait::async_trait;
use std::sync::Arc;
use trading_core::{
    error::ProviderError, traits::DecisionProvider, IndicatorSnapshot, OpenPosition,
    TradeDecision,
};

use crate::DecisionEngine;

/// Reference provider: deterministic rules, no I/O, never retried.
#[derive(Debug, Clone)]
pub struct RuleProvider {
    engine: Arc<DecisionEngine>,
}

impl RuleProvider {
    pub fn new(engine: Arc<DecisionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }
}

#[async_trait]
impl DecisionProvider for RuleProvider {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        Ok(self.engine.decide(snapshot, position))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use trading_core::{names, TradeAction};

    #[tokio::test]
    async fn test_rule_provider_matches_engine() {
        let engine = Arc::new(DecisionEngine::new(EngineConfig::default()).unwrap());
        let provider = RuleProvider::new(engine.clone());
        let snap = IndicatorSnapshot::new("EURUSD", 0, 1.1050, 500)
            .with(names::EMA_FAST, 1.1050)
            .with(names::EMA_SLOW, 1.1020)
            .with(names::ADX, 30.0)
            .with(names::RSI, 55.0)
            .with(names::ATR, 0.0012);

        let decision = provider.produce_decision(&snap, None).await.unwrap();
        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision, engine.decide(&snap, None));
        assert_eq!(provider.name(), "rules");
    }
}
