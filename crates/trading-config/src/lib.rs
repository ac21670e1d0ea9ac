//! Configuration management.

mod credentials;
mod settings;

pub use credentials::{api_key, CredentialsError, TerminalCredentials};
pub use settings::{
    AppConfig, AppSettings, DataSettings, LoggingConfig, ProviderKind, ProviderSettings,
    TerminalSettings, TraderSettings,
};

use config::{Config, Environment, File};
use std::path::Path;
use trading_core::error::TradingError;

/// Load configuration from file and environment, then validate it.
///
/// Without an explicit path `config/default.toml` is used when present.
/// `TRADING__SECTION__KEY` variables override file values, e.g.
/// `TRADING__TRADER__SYMBOLS=EURUSD,USDJPY`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, TradingError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let config: AppConfig = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("trader.symbols")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| TradingError::Config(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[trader]
symbols = ["EURUSD"]
risk_percent = 0.5
max_concurrency = 2

[engine.trend_following]
adx_threshold = 30.0

[provider]
kind = "llm"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.trader.symbols, vec!["EURUSD".to_string()]);
        assert_eq!(config.trader.data_bars, 500);
        assert_eq!(config.engine.trend_following.adx_threshold, 30.0);
        assert_eq!(config.engine.min_bars, 50);
        assert_eq!(config.provider.kind, ProviderKind::Llm);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[guard]\nmax_retries = 0").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(TradingError::Config(_))
        ));
    }
}
