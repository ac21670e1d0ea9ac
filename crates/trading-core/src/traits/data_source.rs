//! Data source trait definition.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;

/// Trait for historical candle sources.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the most recent `count` bars.
    ///
    /// # Returns
    /// Bars ordered from oldest to newest; fewer than `count` when the
    /// history is shorter.
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Check whether the source has data for a symbol.
    async fn has_symbol(&self, symbol: &str) -> Result<bool, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
