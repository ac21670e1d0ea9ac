//! OHLCV candles.

use serde::{Deserialize, Serialize};

/// One candle as copied from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Tick volume
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Every price finite and high >= low.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
            && self.high >= self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_bar() {
        assert!(Bar::new(1000, 1.1000, 1.1050, 1.0980, 1.1030, 1200.0).is_well_formed());

        let inverted = Bar::new(0, 1.0, 0.9, 1.1, 1.0, 0.0);
        assert!(!inverted.is_well_formed());

        let nan = Bar::new(0, 1.0, f64::NAN, 0.9, 1.0, 0.0);
        assert!(!nan.is_well_formed());
    }
}
