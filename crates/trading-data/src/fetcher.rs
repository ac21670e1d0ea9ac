//! Per-cycle market data: bars in, indicator snapshot out.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use trading_core::error::{DataError, TradingError};
use trading_core::traits::DataSource;
use trading_core::types::{Bar, IndicatorSnapshot, Timeframe};
use trading_indicators::{SnapshotBuilder, SnapshotConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeframe: Timeframe,
    /// History requested per cycle
    pub bars: usize,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::M15,
            bars: 500,
            max_retries: 3,
            retry_delay_secs: 5,
        }
    }
}

/// Latest snapshot together with the bar it closes on.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub snapshot: IndicatorSnapshot,
    pub last_bar: Bar,
}

/// Pulls history from a data source and condenses it into a snapshot,
/// retrying transient failures.
pub struct MarketDataFetcher {
    source: Arc<dyn DataSource>,
    config: FetcherConfig,
    indicators: SnapshotConfig,
}

impl MarketDataFetcher {
    pub fn new(source: Arc<dyn DataSource>, config: FetcherConfig, indicators: SnapshotConfig) -> Self {
        Self {
            source,
            config,
            indicators,
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch and build the latest snapshot, or `None` once every attempt
    /// has failed.
    pub async fn fetch(&self, symbol: &str) -> Option<MarketData> {
        let attempts = self.config.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.try_fetch(symbol).await {
                Ok(data) => return Some(data),
                Err(e) => {
                    warn!(symbol, attempt, error = %e, "Data fetch attempt failed");
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                    }
                }
            }
        }
        error!(symbol, attempts, "Failed to get market data");
        None
    }

    async fn try_fetch(&self, symbol: &str) -> Result<MarketData, TradingError> {
        if !self.source.has_symbol(symbol).await? {
            return Err(DataError::SymbolNotFound(symbol.to_string()).into());
        }

        let bars = self
            .source
            .fetch_bars(symbol, self.config.timeframe, self.config.bars)
            .await?;
        let last_bar = *bars
            .last()
            .ok_or_else(|| DataError::NoDataAvailable(symbol.to_string()))?;

        let snapshot = SnapshotBuilder::build(symbol, self.indicators.clone(), &bars)?
            .ok_or_else(|| DataError::NoDataAvailable(symbol.to_string()))?;

        Ok(MarketData { snapshot, last_bar })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times before serving a rising series.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataSource for Flaky {
        async fn fetch_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            count: usize,
        ) -> Result<Vec<Bar>, DataError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(DataError::Internal("terminal busy".into()));
            }
            Ok((0..count)
                .map(|i| {
                    let c = 1.1 + i as f64 * 0.0001;
                    Bar::new(i as i64 * 900_000, c, c + 0.0005, c - 0.0005, c, 100.0)
                })
                .collect())
        }

        async fn has_symbol(&self, symbol: &str) -> Result<bool, DataError> {
            Ok(symbol == "EURUSD")
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn fetcher(failures: u32) -> MarketDataFetcher {
        let source = Arc::new(Flaky {
            failures,
            calls: AtomicU32::new(0),
        });
        let config = FetcherConfig {
            bars: 120,
            retry_delay_secs: 0,
            ..Default::default()
        };
        MarketDataFetcher::new(source, config, SnapshotConfig::default())
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let data = fetcher(2).fetch("EURUSD").await.unwrap();
        assert_eq!(data.snapshot.bars, 120);
        assert_eq!(data.snapshot.close, data.last_bar.close);
        assert!(data.snapshot.indicator("ema_slow").is_ok());
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        assert!(fetcher(3).fetch("EURUSD").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        assert!(fetcher(0).fetch("GBPNZD").await.is_none());
    }
}
