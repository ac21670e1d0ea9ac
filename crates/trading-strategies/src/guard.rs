//! Retry, timeout and validation around an external decision provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use trading_core::{
    error::{ProviderError, TradingError},
    traits::{DecisionProvider, StrategyConfig},
    IndicatorSnapshot, OpenPosition, TradeDecision,
};

use crate::DecisionValidator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Attempts before giving up
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_delay_ms: u64,
    /// Per-attempt deadline
    pub timeout_secs: u64,
    /// Reward/risk floor for provider decisions (`None` disables it)
    pub min_risk_reward: Option<f64>,
    /// Bars a snapshot needs behind it before the provider is asked
    pub min_bars: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 2000,
            timeout_secs: 30,
            min_risk_reward: Some(1.5),
            min_bars: 50,
        }
    }
}

impl GuardConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StrategyConfig for GuardConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.max_retries == 0 {
            return Err(TradingError::Config("guard max_retries must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(TradingError::Config("guard timeout_secs must be at least 1".into()));
        }
        if self.min_bars == 0 {
            return Err(TradingError::Config("guard min_bars must be at least 1".into()));
        }
        if let Some(rr) = self.min_risk_reward {
            if !(rr > 0.0 && rr.is_finite()) {
                return Err(TradingError::Config("min_risk_reward must be positive".into()));
            }
        }
        Ok(())
    }
}

/// Wraps a provider whose answers cannot be trusted as-is.
///
/// Every attempt is bounded by the timeout and its output validated,
/// including the risk/reward floor. Snapshots backed by fewer than
/// `min_bars` bars hold without reaching the provider. Failed attempts are
/// retried after a fixed delay; once attempts run out the canonical fallback
/// is returned.
/// Snapshot problems are not retried since another call cannot fix them.
pub struct GuardedProvider<P> {
    inner: P,
    config: GuardConfig,
    validator: DecisionValidator,
}

impl<P: DecisionProvider> GuardedProvider<P> {
    pub fn new(inner: P, config: GuardConfig) -> Self {
        let validator = match config.min_risk_reward {
            Some(rr) => DecisionValidator::with_min_risk_reward(rr),
            None => DecisionValidator::structural(),
        };
        Self {
            inner,
            config,
            validator,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Always produces a decision.
    pub async fn decide(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> TradeDecision {
        if let Err(e) = snapshot.require_bars(self.config.min_bars) {
            debug!(symbol = %snapshot.symbol, provider = self.inner.name(), error = %e, "Not enough bars");
            return TradeDecision::insufficient_data();
        }

        let price = match snapshot.price() {
            Ok(p) => p,
            Err(e) => {
                warn!(symbol = %snapshot.symbol, error = %e, "Snapshot unusable");
                return TradeDecision::fallback_with(e);
            }
        };

        let attempts = self.config.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.attempt(snapshot, position, price).await {
                Ok(decision) => {
                    info!(
                        symbol = %snapshot.symbol,
                        provider = self.inner.name(),
                        action = %decision.action,
                        confidence = decision.confidence,
                        attempt,
                        "Provider decision accepted"
                    );
                    return decision;
                }
                Err(ProviderError::Snapshot(e)) => {
                    warn!(symbol = %snapshot.symbol, error = %e, "Snapshot unusable");
                    return TradeDecision::fallback_with(e);
                }
                Err(e) => {
                    warn!(
                        symbol = %snapshot.symbol,
                        provider = self.inner.name(),
                        attempt,
                        max_retries = attempts,
                        error = %e,
                        "Provider attempt failed"
                    );
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
        }

        warn!(symbol = %snapshot.symbol, provider = self.inner.name(), "Retries exhausted, holding");
        TradeDecision::fallback()
    }

    async fn attempt(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
        price: f64,
    ) -> Result<TradeDecision, ProviderError> {
        let timeout = self.config.timeout();
        let decision = tokio::time::timeout(timeout, self.inner.produce_decision(snapshot, position))
            .await
            .map_err(|_| ProviderError::Timeout(timeout))??;
        Ok(self.validator.validate(decision, price)?)
    }
}

#[async_trait]
impl<P: DecisionProvider> DecisionProvider for GuardedProvider<P> {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        Ok(self.decide(snapshot, position).await)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
