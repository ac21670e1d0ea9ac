//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use trading_core::error::TradingError;
use trading_core::traits::StrategyConfig;
use trading_core::types::Timeframe;
use trading_indicators::SnapshotConfig;
use trading_strategies::{EngineConfig, GuardConfig};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trader: TraderSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub indicators: SnapshotConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub terminal: TerminalSettings,
}

impl AppConfig {
    /// Check cross-field constraints and every nested section.
    pub fn validate(&self) -> Result<(), TradingError> {
        self.trader.validate()?;
        self.engine.validate()?;
        self.guard.validate()?;
        if self.terminal.min_lot <= Decimal::ZERO {
            return Err(TradingError::Config("terminal.min_lot must be positive".into()));
        }
        if self.data.max_retries == 0 {
            return Err(TradingError::Config("data.max_retries must be at least 1".into()));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, TradingError> {
        toml::to_string_pretty(self).map_err(|e| TradingError::Serialization(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "fx-trader".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily rolling log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// What the bot trades and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderSettings {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    /// Percentage of balance risked per trade
    pub risk_percent: Decimal,
    /// History requested per cycle
    pub data_bars: usize,
    pub log_dir: PathBuf,
    pub trade_interval_secs: u64,
    /// Symbols processed at once; 1 runs them in order
    pub max_concurrency: usize,
}

impl Default for TraderSettings {
    fn default() -> Self {
        Self {
            symbols: ["USDCAD", "EURUSD", "XAUUSD", "USDJPY"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeframe: Timeframe::M15,
            risk_percent: dec!(1.0),
            data_bars: 500,
            log_dir: PathBuf::from("trade_logs"),
            trade_interval_secs: 900,
            max_concurrency: 1,
        }
    }
}

impl TraderSettings {
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.symbols.is_empty() {
            return Err(TradingError::Config("trader.symbols must not be empty".into()));
        }
        if self.risk_percent <= Decimal::ZERO || self.risk_percent > dec!(100) {
            return Err(TradingError::Config(
                "trader.risk_percent must be within (0, 100]".into(),
            ));
        }
        if self.data_bars == 0 {
            return Err(TradingError::Config("trader.data_bars must be positive".into()));
        }
        if self.trade_interval_secs == 0 {
            return Err(TradingError::Config(
                "trader.trade_interval_secs must be positive".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(TradingError::Config(
                "trader.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where bars come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory of CSV history
    pub dir: PathBuf,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            max_retries: 3,
            retry_delay_secs: 5,
        }
    }
}

/// Decision provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Deterministic rule engine
    #[default]
    Rules,
    /// Hosted chat model
    Llm,
    /// Local gradient-boosted model
    Ml,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Rules => write!(f, "rules"),
            ProviderKind::Llm => write!(f, "llm"),
            ProviderKind::Ml => write!(f, "ml"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rules" => Ok(ProviderKind::Rules),
            "llm" => Ok(ProviderKind::Llm),
            "ml" => Ok(ProviderKind::Ml),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// Trading session named in prompts
    pub session: String,
    /// Gradient-boosted model artifact
    pub model_path: PathBuf,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Rules,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: 300,
            request_timeout_secs: 30,
            session: "London".to_string(),
            model_path: PathBuf::from("models/xgb_model.json"),
        }
    }
}

/// Terminal login and deal parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    pub server_env: String,
    pub login_env: String,
    pub password_env: String,
    /// Maximum slippage in points
    pub deviation: u32,
    pub min_lot: Decimal,
    pub comment: String,
    /// Starting balance of the paper terminal
    pub paper_balance: Decimal,
    /// Paper terminal spread in points
    pub spread_points: f64,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            server_env: "SERVER".to_string(),
            login_env: "LOGIN".to_string(),
            password_env: "PASSWORD".to_string(),
            deviation: 20,
            min_lot: dec!(0.01),
            comment: "AI Trade".to_string(),
            paper_balance: dec!(10000),
            spread_points: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trader.symbols.len(), 4);
        assert_eq!(config.trader.timeframe, Timeframe::M15);
        assert_eq!(config.guard.max_retries, 3);
        assert_eq!(config.provider.kind, ProviderKind::Rules);
    }

    #[test]
    fn test_invalid_trader_settings() {
        let mut config = AppConfig::default();
        config.trader.symbols.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.trader.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.engine.min_bars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("LLM".parse::<ProviderKind>().unwrap(), ProviderKind::Llm);
        assert!("gpt".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[trader]"));
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.trader.symbols, AppConfig::default().trader.symbols);
    }
}
