//! Decisions from a hosted chat-completion model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use trading_core::{
    error::ProviderError, names, traits::DecisionProvider, IndicatorSnapshot, OpenPosition,
    TradeAction, TradeDecision, Trend,
};

use crate::error::{AiError, AiResult};

/// Volatility above this ATR reads as "High" in the prompt.
const HIGH_VOLATILITY_ATR: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatCompletionConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Chart timeframe quoted in the prompt
    pub timeframe: String,
    /// Risk per trade quoted in the prompt
    pub risk_percent: f64,
    /// Risk/reward floor quoted in the prompt
    pub min_risk_reward: f64,
    /// Trading session quoted in the prompt
    pub session: String,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.1,
            max_tokens: 300,
            request_timeout_secs: 30,
            timeframe: "M15".to_string(),
            risk_percent: 1.0,
            min_risk_reward: 1.5,
            session: "London".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Decision shape the model is asked to answer with.
#[derive(Debug, Clone, Deserialize)]
struct RawDecision {
    action: String,
    #[serde(default)]
    stop_loss: f64,
    #[serde(default)]
    take_profit: f64,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// Asks a chat model for a decision and parses its JSON answer.
///
/// The answer is only shape-checked here; level ordering and risk/reward
/// are left to the guard wrapping this provider.
#[derive(Clone)]
pub struct ChatCompletionProvider {
    client: reqwest::Client,
    config: ChatCompletionConfig,
    api_key: String,
}

impl ChatCompletionProvider {
    pub fn new(config: ChatCompletionConfig, api_key: impl Into<String>) -> AiResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &ChatCompletionConfig {
        &self.config
    }

    /// System and user messages for one snapshot.
    pub fn build_messages(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<Vec<ChatMessage>, ProviderError> {
        let atr = snapshot.indicator(names::ATR)?;
        let ema_slow = snapshot.indicator(names::EMA_SLOW)?;
        let price = snapshot.price()?;

        let trend_factor = if price > ema_slow { 1.0 } else { 1.5 };
        let sl_distance = atr * 2.0 * trend_factor;
        let volatility = if atr > HIGH_VOLATILITY_ATR { "High" } else { "Low" };

        let system = format!(
            "Act as a professional FX trader. Rules:\n\
             1. Use {} timeframe\n\
             2. Max risk: {}% per trade\n\
             3. Stop loss: {:.5} pips\n\
             4. Minimum {}:1 risk/reward\n\
             5. Consider volatility: {}",
            self.config.timeframe,
            self.config.risk_percent,
            sl_distance,
            self.config.min_risk_reward,
            volatility
        );

        Ok(vec![
            ChatMessage::new("system", system),
            ChatMessage::new("user", self.build_prompt(snapshot, position)?),
        ])
    }

    fn build_prompt(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<String, ProviderError> {
        let fmt = |name: &str| {
            snapshot
                .get(name)
                .filter(|v| v.is_finite())
                .map(|v| format!("{:.5}", v))
                .unwrap_or_else(|| "N/A".to_string())
        };
        let trend = if snapshot.close > snapshot.indicator(names::EMA_SLOW)? {
            Trend::Bullish
        } else {
            Trend::Bearish
        };

        let mut prompt = format!(
            "Analyze {} market conditions:\n\n\
             Technical Indicators:\n\
             - Price: {:.5}\n\
             - RSI(14): {}\n\
             - MACD: {}\n\
             - Bollinger Bands: {}/{}\n\
             - ATR(14): {}\n\
             - ADX(14): {}\n\
             - EMA(20): {}\n\
             - EMA(50): {}\n\n\
             Market Context:\n\
             - Trend: {}\n\
             - Session: {}\n",
            snapshot.symbol,
            snapshot.close,
            fmt(names::RSI),
            fmt(names::MACD),
            fmt(names::BOLLINGER_UPPER),
            fmt(names::BOLLINGER_LOWER),
            fmt(names::ATR),
            fmt(names::ADX),
            fmt(names::EMA_FAST),
            fmt(names::EMA_SLOW),
            trend,
            self.config.session,
        );

        if let Some(pos) = position {
            prompt.push_str(&format!(
                "- Open position: {} {} lots at {:.5} (SL {:.5}, TP {:.5})\n",
                pos.direction, pos.volume, pos.open_price, pos.stop_loss, pos.take_profit
            ));
        }

        prompt.push_str(
            "\nProvide JSON response: {\"action\": \"buy/sell/hold\", \"stop_loss\": price, \
             \"take_profit\": price, \"confidence\": 0.0-1.0, \"reasoning\": \"technical analysis\"}",
        );
        Ok(prompt)
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> AiResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<ChatResponse>().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::InvalidResponse("no choices in response".to_string()))
    }
}

/// Parse the model's JSON answer into a decision with levels rounded to
/// 5 decimals and confidence to 2.
pub fn parse_decision(content: &str) -> Result<TradeDecision, ProviderError> {
    let raw: RawDecision = serde_json::from_str(content)
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid JSON response: {}", e)))?;

    let action: TradeAction = raw.action.parse()?;
    if action.is_directional() && (raw.stop_loss <= 0.0 || raw.take_profit <= 0.0) {
        return Err(ProviderError::InvalidResponse(
            "Positive price levels required for active trades".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(ProviderError::InvalidResponse(
            "Confidence must be between 0 and 1".to_string(),
        ));
    }

    Ok(TradeDecision {
        action,
        stop_loss: raw.stop_loss,
        take_profit: raw.take_profit,
        confidence: raw.confidence,
        reasoning: raw.reasoning,
    }
    .rounded())
}

#[async_trait]
impl DecisionProvider for ChatCompletionProvider {
    async fn produce_decision(
        &self,
        snapshot: &IndicatorSnapshot,
        position: Option<&OpenPosition>,
    ) -> Result<TradeDecision, ProviderError> {
        let messages = self.build_messages(snapshot, position)?;
        debug!(symbol = %snapshot.symbol, model = %self.config.model, "Requesting decision");

        let content = self.complete(messages).await?;
        parse_decision(&content)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

impl std::fmt::Debug for ChatCompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionProvider")
            .field("config", &self.config)
            .field("api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::error::{SnapshotError, ValidationError};
    use trading_core::Direction;

    fn provider() -> ChatCompletionProvider {
        ChatCompletionProvider::new(ChatCompletionConfig::default(), "sk-test").unwrap()
    }

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot::new("EURUSD", 0, 1.1050, 500)
            .with(names::EMA_FAST, 1.1050)
            .with(names::EMA_SLOW, 1.1020)
            .with(names::RSI, 55.0)
            .with(names::ATR, 0.0012)
            .with(names::MACD, 0.0004)
    }

    #[test]
    fn test_parse_valid_decision() {
        let content = r#"{"action": "buy", "stop_loss": 1.1031999, "take_profit": 1.1080004,
                          "confidence": 0.786, "reasoning": "bullish EMA stack"}"#;
        let decision = parse_decision(content).unwrap();

        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.stop_loss, 1.1032);
        assert_eq!(decision.take_profit, 1.108);
        assert_eq!(decision.confidence, 0.79);
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = parse_decision(r#"{"action": "close", "confidence": 0.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Rejected(ValidationError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            parse_decision("not json"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_decision(r#"{"action": "sell", "stop_loss": 0, "take_profit": 1.1, "confidence": 0.7}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_decision(r#"{"action": "hold", "confidence": 1.5}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_hold_without_levels() {
        let decision = parse_decision(r#"{"action": "HOLD", "confidence": 0.3}"#).unwrap();
        assert!(decision.is_hold());
        assert_eq!(decision.stop_loss, 0.0);
    }

    #[test]
    fn test_messages_carry_indicators() {
        let messages = provider().build_messages(&snapshot(), None).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Use M15 timeframe"));
        assert!(messages[0].content.contains("Minimum 1.5:1 risk/reward"));
        assert!(messages[0].content.contains("Consider volatility: Low"));
        assert!(messages[1].content.contains("Analyze EURUSD"));
        assert!(messages[1].content.contains("RSI(14): 55.00000"));
        assert!(messages[1].content.contains("Bollinger Bands: N/A/N/A"));
        assert!(messages[1].content.contains("Trend: Bullish"));
    }

    #[test]
    fn test_messages_mention_open_position() {
        let position = OpenPosition {
            ticket: 1,
            symbol: "EURUSD".into(),
            direction: Direction::Long,
            volume: 0.3,
            open_price: 1.1000,
            stop_loss: 1.0970,
            take_profit: 1.1060,
        };
        let messages = provider().build_messages(&snapshot(), Some(&position)).unwrap();
        assert!(messages[1].content.contains("Open position: long 0.3 lots"));
    }

    #[test]
    fn test_messages_need_atr() {
        let snap = IndicatorSnapshot::new("EURUSD", 0, 1.1, 500).with(names::EMA_SLOW, 1.1);
        assert!(matches!(
            provider().build_messages(&snap, None),
            Err(ProviderError::Snapshot(SnapshotError::MissingIndicator(_)))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage::new("user", "hi".into())],
            temperature: 0.1,
            max_tokens: 300,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.1);
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            ChatCompletionProvider::new(ChatCompletionConfig::default(), " "),
            Err(AiError::MissingApiKey(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let config = ChatCompletionConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let provider = ChatCompletionProvider::new(config, "sk-test").unwrap();
        let err = provider.produce_decision(&snapshot(), None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request(_)));
    }
}
