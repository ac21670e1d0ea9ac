//! Indicator snapshots: one instrument at one point in time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SnapshotError;

/// Canonical indicator keys.
pub mod names {
    pub const EMA_FAST: &str = "ema_fast";
    pub const EMA_SLOW: &str = "ema_slow";
    pub const RSI: &str = "rsi";
    pub const ATR: &str = "atr";
    /// Rolling mean of ATR over the breakout window.
    pub const ATR_MEAN: &str = "atr_mean";
    pub const ADX: &str = "adx";
    pub const BOLLINGER_UPPER: &str = "bollinger_upper";
    pub const BOLLINGER_MIDDLE: &str = "bollinger_middle";
    pub const BOLLINGER_LOWER: &str = "bollinger_lower";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HISTOGRAM: &str = "macd_histogram";
}

/// Direction of the moving-average stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
            Trend::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Market state handed to decision providers.
///
/// Produced once per cycle by the data side and never mutated afterwards;
/// every reader goes through [`IndicatorSnapshot::indicator`], which rejects
/// missing keys and non-finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    /// Unix timestamp in milliseconds of the bar the snapshot closes on
    pub timestamp: i64,
    pub close: f64,
    /// Number of historical bars behind the indicator values
    pub bars: usize,
    indicators: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new(symbol: impl Into<String>, timestamp: i64, close: f64, bars: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            close,
            bars,
            indicators: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.indicators.insert(name.into(), value);
        self
    }

    /// Look up a named indicator.
    pub fn indicator(&self, name: &str) -> Result<f64, SnapshotError> {
        let value = *self
            .indicators
            .get(name)
            .ok_or_else(|| SnapshotError::MissingIndicator(name.to_string()))?;
        if !value.is_finite() {
            return Err(SnapshotError::NonNumeric {
                name: name.to_string(),
                value,
            });
        }
        Ok(value)
    }

    /// Raw lookup without validation.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied()
    }

    /// The reference price, rejected when non-finite or not positive.
    pub fn price(&self) -> Result<f64, SnapshotError> {
        if self.close.is_finite() && self.close > 0.0 {
            Ok(self.close)
        } else {
            Err(SnapshotError::InvalidPrice(self.close))
        }
    }

    /// Fail unless at least `required` bars back the snapshot.
    pub fn require_bars(&self, required: usize) -> Result<(), SnapshotError> {
        if self.bars < required {
            return Err(SnapshotError::InsufficientBars {
                required,
                available: self.bars,
            });
        }
        Ok(())
    }

    /// Fast vs slow EMA.
    pub fn trend(&self) -> Result<Trend, SnapshotError> {
        let fast = self.indicator(names::EMA_FAST)?;
        let slow = self.indicator(names::EMA_SLOW)?;
        Ok(if fast > slow {
            Trend::Bullish
        } else if fast < slow {
            Trend::Bearish
        } else {
            Trend::Neutral
        })
    }

    /// Iterate indicators in key order.
    pub fn indicators(&self) -> impl Iterator<Item = (&str, f64)> {
        self.indicators.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot::new("EURUSD", 0, 1.1050, 500)
            .with(names::EMA_FAST, 1.1050)
            .with(names::EMA_SLOW, 1.1020)
            .with(names::RSI, f64::NAN)
    }

    #[test]
    fn test_indicator_lookup() {
        let snap = snapshot();
        assert_eq!(snap.indicator(names::EMA_FAST).unwrap(), 1.1050);
        assert_eq!(
            snap.indicator(names::ADX),
            Err(SnapshotError::MissingIndicator("adx".into()))
        );
        assert!(matches!(
            snap.indicator(names::RSI),
            Err(SnapshotError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_trend() {
        assert_eq!(snapshot().trend().unwrap(), Trend::Bullish);
        let flat = IndicatorSnapshot::new("X", 0, 1.0, 1)
            .with(names::EMA_FAST, 1.0)
            .with(names::EMA_SLOW, 1.0);
        assert_eq!(flat.trend().unwrap(), Trend::Neutral);
    }

    #[test]
    fn test_price_and_bars() {
        let snap = snapshot();
        assert!(snap.require_bars(500).is_ok());
        assert!(snap.require_bars(501).is_err());

        let bad = IndicatorSnapshot::new("X", 0, f64::INFINITY, 10);
        assert!(bad.price().is_err());
    }
}
