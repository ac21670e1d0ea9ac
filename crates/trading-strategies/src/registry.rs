//! Catalogue of the built-in rules for listing and inspection.

use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;

use crate::EngineConfig;

/// Information about a registered rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Key used in configuration
    pub key: String,
    /// Display name
    pub name: String,
    /// Evaluation priority (1 = first)
    pub priority: usize,
    pub description: String,
    /// Effective configuration as JSON
    pub config: serde_json::Value,
}

/// Registry of the rules the engine evaluates, in priority order.
pub struct StrategyRegistry {
    strategies: Vec<StrategyInfo>,
}

impl StrategyRegistry {
    /// Describe the rules for a given engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self, TradingError> {
        let to_json = |v: serde_json::Result<serde_json::Value>| {
            v.map_err(|e| TradingError::Serialization(e.to_string()))
        };

        let strategies = vec![
            StrategyInfo {
                key: "trend_following".to_string(),
                name: "Trend Following".to_string(),
                priority: 1,
                description: "EMA stack confirmed by ADX strength and RSI momentum".to_string(),
                config: to_json(serde_json::to_value(&config.trend_following))?,
            },
            StrategyInfo {
                key: "mean_reversion".to_string(),
                name: "Mean Reversion".to_string(),
                priority: 2,
                description: "Bollinger Band touch with RSI oversold or overbought".to_string(),
                config: to_json(serde_json::to_value(&config.mean_reversion))?,
            },
            StrategyInfo {
                key: "breakout".to_string(),
                name: "Breakout".to_string(),
                priority: 3,
                description: "ATR expanding past its rolling mean, direction from RSI".to_string(),
                config: to_json(serde_json::to_value(&config.breakout))?,
            },
        ];

        Ok(Self { strategies })
    }

    /// List all rules in priority order.
    pub fn list(&self) -> &[StrategyInfo] {
        &self.strategies
    }

    /// Get rule info by key.
    pub fn get(&self, key: &str) -> Option<&StrategyInfo> {
        self.strategies.iter().find(|s| s.key == key)
    }

    /// Check if a rule exists.
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
