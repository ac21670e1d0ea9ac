//! Decision provider trait definition.

use crate::error::ProviderError;
use crate::types::{IndicatorSnapshot, OpenPosition, TradeDecision};
use async_trait::async_trait;
use std::sync::Arc;

/// Anything that turns a market snapshot into a trade decision.
///
/// The rule engine, a hosted language model and a local classifier all sit
/// behind this trait so the bot loop can swap them freely.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Produce a decision for one instrument.
    ///
    /// # Arguments
    /// * `snapshot` - Indicator values for the instrument
    /// * `position` - The position currently open on the instrument, if any
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

#[async_trait]
impl<P: DecisionProvider + ?Sized> DecisionProvider for Arc<P> {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        (**self).produce_decision(snapshot, position).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<P: DecisionProvider + ?Sized> DecisionProvider for Box<P> {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        (**self).produce_decision(snapshot, position).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(TradeDecision);

    #[async_trait]
    impl DecisionProvider for Always {
        async fn produce_decision(
            &self,
            _snapshot: &IndicatorSnapshot,
            _position: Option<&OpenPosition>,
        ) -> Result<TradeDecision, ProviderError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "always"
        }
    }

    #[tokio::test]
    async fn test_shared_provider_delegates() {
        let shared: Arc<dyn DecisionProvider> = Arc::new(Always(TradeDecision::no_signal()));
        let snapshot = IndicatorSnapshot::new("EURUSD", 0, 1.1, 100);

        let decision = shared.produce_decision(&snapshot, None).await.unwrap();
        assert_eq!(decision, TradeDecision::no_signal());
        assert_eq!(DecisionProvider::name(&shared), "always");
    }
}
