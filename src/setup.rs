//! Wiring configuration into runtime components.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use trading_ai::{
    ChatCompletionConfig, ChatCompletionProvider, GradientBoostedConfig, GradientBoostedProvider,
};
use trading_broker::{OrderManagerConfig, PaperTerminalConfig};
use trading_config::{api_key, AppConfig, ProviderKind};
use trading_core::traits::DecisionProvider;
use trading_data::FetcherConfig;
use trading_risk::LotSizerConfig;
use trading_strategies::{DecisionEngine, GuardedProvider, RuleProvider};

/// Build the decision provider for `kind`.
///
/// The rule engine is used as-is; external providers always sit behind the
/// guard so their output is validated and bounded.
pub fn build_provider(config: &AppConfig, kind: ProviderKind) -> Result<Arc<dyn DecisionProvider>> {
    let provider: Arc<dyn DecisionProvider> = match kind {
        ProviderKind::Rules => {
            let engine = DecisionEngine::new(config.engine.clone())?;
            Arc::new(RuleProvider::new(Arc::new(engine)))
        }
        ProviderKind::Llm => {
            let key = api_key(&config.provider.api_key_env)?;
            let llm = ChatCompletionProvider::new(chat_config(config), key)?;
            Arc::new(GuardedProvider::new(llm, config.guard.clone()))
        }
        ProviderKind::Ml => {
            let ml = GradientBoostedProvider::load(GradientBoostedConfig {
                model_path: config.provider.model_path.clone(),
                ..Default::default()
            })
            .with_context(|| {
                format!(
                    "Failed to load model from {}",
                    config.provider.model_path.display()
                )
            })?;
            Arc::new(GuardedProvider::new(ml, config.guard.clone()))
        }
    };

    info!(provider = provider.name(), "Decision provider ready");
    Ok(provider)
}

pub fn chat_config(config: &AppConfig) -> ChatCompletionConfig {
    let p = &config.provider;
    ChatCompletionConfig {
        base_url: p.base_url.clone(),
        model: p.model.clone(),
        temperature: p.temperature,
        max_tokens: p.max_tokens,
        request_timeout_secs: p.request_timeout_secs,
        timeframe: config.trader.timeframe.to_string(),
        risk_percent: config.trader.risk_percent.to_string().parse().unwrap_or(1.0),
        min_risk_reward: config.guard.min_risk_reward.unwrap_or(1.5),
        session: p.session.clone(),
    }
}

pub fn order_config(config: &AppConfig) -> OrderManagerConfig {
    OrderManagerConfig {
        deviation: config.terminal.deviation,
        comment: config.terminal.comment.clone(),
        sizing: LotSizerConfig {
            risk_percent: config.trader.risk_percent,
            min_lot: config.terminal.min_lot,
        },
    }
}

pub fn paper_config(config: &AppConfig) -> PaperTerminalConfig {
    PaperTerminalConfig {
        initial_balance: config.terminal.paper_balance,
        spread_points: config.terminal.spread_points,
        ..Default::default()
    }
}

pub fn fetcher_config(config: &AppConfig) -> FetcherConfig {
    FetcherConfig {
        timeframe: config.trader.timeframe,
        bars: config.trader.data_bars,
        max_retries: config.data.max_retries,
        retry_delay_secs: config.data.retry_delay_secs,
    }
}

/// CLI override, else the configured directory.
pub fn data_dir<'a>(config: &'a AppConfig, over: Option<&'a Path>) -> &'a Path {
    over.unwrap_or(config.data.dir.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rules_provider_builds() {
        let provider = build_provider(&AppConfig::default(), ProviderKind::Rules).unwrap();
        assert_eq!(provider.name(), "rules");
    }

    #[test]
    fn test_missing_model_fails() {
        let mut config = AppConfig::default();
        config.provider.model_path = "/nonexistent/model.json".into();
        assert!(build_provider(&config, ProviderKind::Ml).is_err());
    }

    #[test]
    fn test_config_mapping() {
        let mut config = AppConfig::default();
        config.trader.risk_percent = dec!(0.5);
        config.terminal.deviation = 30;

        let orders = order_config(&config);
        assert_eq!(orders.deviation, 30);
        assert_eq!(orders.sizing.risk_percent, dec!(0.5));
        assert_eq!(chat_config(&config).risk_percent, 0.5);
        assert_eq!(fetcher_config(&config).bars, 500);
    }
}
