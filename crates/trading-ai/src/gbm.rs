//! Decisions from a locally scored gradient-boosted tree ensemble.
//!
//! The model artifact is plain JSON:
//!
//! ```json
//! {
//!   "feature_names": ["ema_fast", "ema_slow", "rsi", "macd"],
//!   "base_score": 0.0,
//!   "trees": [
//!     { "nodes": [
//!         { "split": { "feature": 2, "threshold": 50.0, "left": 1, "right": 2 } },
//!         { "leaf": { "value": -0.4 } },
//!         { "leaf": { "value": 0.6 } }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Trees are summed in margin space and squashed with a sigmoid into the
//! probability that price moves up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trading_core::{
    error::ProviderError, names, traits::DecisionProvider, Direction, IndicatorSnapshot,
    OpenPosition, TradeDecision,
};
use trading_risk::protective_levels;

use crate::error::{AiError, AiResult};

/// Features the model is trained on, in order. `macd` is the fast/slow
/// EMA spread.
pub const FEATURES: [&str; 4] = [names::EMA_FAST, names::EMA_SLOW, names::RSI, "macd"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf. `x < threshold` goes left.
    fn score(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Every index in range and every child deeper than its parent, so a
    /// walk always terminates.
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} uses unknown feature {}", i, feature));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", i));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedModel {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl GradientBoostedModel {
    /// Load and check a model artifact.
    pub fn load(path: impl AsRef<Path>) -> AiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.check()?;

        info!(
            path = %path.display(),
            trees = model.trees.len(),
            "Loaded gradient-boosted model"
        );
        Ok(model)
    }

    fn check(&self) -> AiResult<()> {
        if self.feature_names != FEATURES {
            return Err(AiError::InvalidModel(format!(
                "expected features {:?}, got {:?}",
                FEATURES, self.feature_names
            )));
        }
        if self.trees.is_empty() {
            return Err(AiError::InvalidModel("model has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.feature_names.len())
                .map_err(|e| AiError::InvalidModel(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Probability that price moves up.
    pub fn predict_proba(&self, features: &[f64; 4]) -> f64 {
        let margin: f64 = self.base_score + self.trees.iter().map(|t| t.score(features)).sum::<f64>();
        1.0 / (1.0 + (-margin).exp())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostedConfig {
    pub model_path: PathBuf,
    /// Up-probability at or above which to buy
    pub buy_threshold: f64,
    /// Up-probability at or below which to sell
    pub sell_threshold: f64,
    /// Stop distance in ATRs
    pub stop_atr_multiplier: f64,
    /// Target distance in ATRs
    pub target_atr_multiplier: f64,
}

impl Default for GradientBoostedConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/xgb_model.json"),
            buy_threshold: 0.55,
            sell_threshold: 0.45,
            stop_atr_multiplier: 1.5,
            target_atr_multiplier: 2.5,
        }
    }
}

impl GradientBoostedConfig {
    pub fn validate(&self) -> AiResult<()> {
        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit(self.buy_threshold) || !in_unit(self.sell_threshold) {
            return Err(AiError::InvalidModel("thresholds must be within [0, 1]".into()));
        }
        if self.sell_threshold >= self.buy_threshold {
            return Err(AiError::InvalidModel(
                "sell_threshold must be below buy_threshold".into(),
            ));
        }
        if self.stop_atr_multiplier <= 0.0 || self.target_atr_multiplier <= 0.0 {
            return Err(AiError::InvalidModel("ATR multipliers must be positive".into()));
        }
        Ok(())
    }
}

/// Scores the snapshot locally and maps the up-probability to a decision.
#[derive(Debug, Clone)]
pub struct GradientBoostedProvider {
    model: GradientBoostedModel,
    config: GradientBoostedConfig,
}

impl GradientBoostedProvider {
    /// Load the model named by `config.model_path`.
    pub fn load(config: GradientBoostedConfig) -> AiResult<Self> {
        config.validate()?;
        let model = GradientBoostedModel::load(&config.model_path)?;
        Ok(Self { model, config })
    }

    pub fn with_model(model: GradientBoostedModel, config: GradientBoostedConfig) -> AiResult<Self> {
        config.validate()?;
        model.check()?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &GradientBoostedModel {
        &self.model
    }

    fn features(snapshot: &IndicatorSnapshot) -> Result<[f64; 4], ProviderError> {
        let ema_fast = snapshot.indicator(names::EMA_FAST)?;
        let ema_slow = snapshot.indicator(names::EMA_SLOW)?;
        let rsi = snapshot.indicator(names::RSI)?;
        Ok([ema_fast, ema_slow, rsi, ema_fast - ema_slow])
    }
}

#[async_trait]
impl DecisionProvider for GradientBoostedProvider {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        _position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        let features = Self::features(snapshot)?;
        let price = snapshot.price()?;
        let atr = snapshot.indicator(names::ATR)?;

        let p_up = self.model.predict_proba(&features);
        debug!(symbol = %snapshot.symbol, p_up, "Scored snapshot");

        let (direction, confidence) = if p_up >= self.config.buy_threshold {
            (Direction::Long, p_up)
        } else if p_up <= self.config.sell_threshold {
            (Direction::Short, 1.0 - p_up)
        } else {
            return Ok(TradeDecision::hold(
                (1.0 - (p_up - 0.5).abs() * 2.0) * 0.5,
                format!("model undecided (p_up={:.2})", p_up),
            )
            .rounded());
        };

        let (stop_loss, _) =
            protective_levels(price, atr, self.config.stop_atr_multiplier, direction);
        let (_, take_profit) =
            protective_levels(price, atr, self.config.target_atr_multiplier, direction);

        Ok(TradeDecision::directional(
            direction.action(),
            stop_loss,
            take_profit,
            confidence,
            format!("model predicts {} (p_up={:.2})", direction, p_up),
        )
        .rounded())
    }

    fn name(&self) -> &str {
        "ml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trading_core::TradeAction;

    /// One stump on RSI: below 50 pushes down, above pushes up.
    fn rsi_stump(weight: f64) -> GradientBoostedModel {
        GradientBoostedModel {
            feature_names: FEATURES.iter().map(|s| s.to_string()).collect(),
            base_score: 0.0,
            trees: vec![Tree {
                nodes: vec![
                    Node::Split {
                        feature: 2,
                        threshold: 50.0,
                        left: 1,
                        right: 2,
                    },
                    Node::Leaf { value: -weight },
                    Node::Leaf { value: weight },
                ],
            }],
        }
    }

    fn snapshot(rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot::new("EURUSD", 0, 1.1050, 500)
            .with(names::EMA_FAST, 1.1050)
            .with(names::EMA_SLOW, 1.1020)
            .with(names::RSI, rsi)
            .with(names::ATR, 0.0010)
    }

    fn provider(weight: f64) -> GradientBoostedProvider {
        GradientBoostedProvider::with_model(rsi_stump(weight), GradientBoostedConfig::default())
            .unwrap()
    }

    #[test]
    fn test_predict_proba() {
        let model = rsi_stump(1.0);
        let up = model.predict_proba(&[1.0, 1.0, 60.0, 0.0]);
        let down = model.predict_proba(&[1.0, 1.0, 40.0, 0.0]);
        assert!((up - 0.731_058_6).abs() < 1e-6);
        assert!((up + down - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_buy_with_atr_levels() {
        let decision = provider(1.0).produce_decision(&snapshot(60.0), None).await.unwrap();

        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.stop_loss, 1.1035);
        assert_eq!(decision.take_profit, 1.1075);
        assert_eq!(decision.confidence, 0.73);
        assert!(decision.risk_reward(1.1050).unwrap() >= 1.5);
    }

    #[tokio::test]
    async fn test_sell_mirrors_levels() {
        let decision = provider(1.0).produce_decision(&snapshot(40.0), None).await.unwrap();

        assert_eq!(decision.action, TradeAction::Sell);
        assert_eq!(decision.stop_loss, 1.1065);
        assert_eq!(decision.take_profit, 1.1025);
    }

    #[tokio::test]
    async fn test_weak_signal_holds() {
        let decision = provider(0.05).produce_decision(&snapshot(60.0), None).await.unwrap();
        assert!(decision.is_hold());
        assert_eq!(decision.stop_loss, 0.0);
    }

    #[tokio::test]
    async fn test_missing_feature_is_snapshot_error() {
        let snap = IndicatorSnapshot::new("EURUSD", 0, 1.1, 500).with(names::EMA_FAST, 1.1);
        let err = provider(1.0).produce_decision(&snap, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Snapshot(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&rsi_stump(0.8)).unwrap()).unwrap();

        let model = GradientBoostedModel::load(file.path()).unwrap();
        assert_eq!(model.trees.len(), 1);
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let mut model = rsi_stump(1.0);
        model.trees[0].nodes[0] = Node::Split {
            feature: 2,
            threshold: 50.0,
            left: 0,
            right: 2,
        };
        assert!(matches!(model.check(), Err(AiError::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_wrong_features() {
        let mut model = rsi_stump(1.0);
        model.feature_names.swap(0, 1);
        assert!(matches!(model.check(), Err(AiError::InvalidModel(_))));
    }

    #[test]
    fn test_config_thresholds() {
        let config = GradientBoostedConfig {
            buy_threshold: 0.4,
            sell_threshold: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(GradientBoostedConfig::default().validate().is_ok());
    }
}
