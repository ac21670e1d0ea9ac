//! Chart timeframes as the terminal names them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe for bars/candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    /// 1 minute bars
    #[serde(rename = "M1")]
    M1,
    /// 5 minute bars
    #[serde(rename = "M5")]
    M5,
    /// 15 minute bars
    #[serde(rename = "M15")]
    #[default]
    M15,
    /// 30 minute bars
    #[serde(rename = "M30")]
    M30,
    /// 1 hour bars
    #[serde(rename = "H1")]
    H1,
    /// 4 hour bars
    #[serde(rename = "H4")]
    H4,
    /// Daily bars
    #[serde(rename = "D1")]
    D1,
    /// Weekly bars
    #[serde(rename = "W1")]
    W1,
    /// Monthly bars
    #[serde(rename = "MN1")]
    MN1,
}

impl Timeframe {
    /// Terminal code, e.g. `M15`.
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "MN1" before lower-casing so it can't collide with "m1"
        if s == "MN1" || s == "1M" {
            return Ok(Timeframe::MN1);
        }
        match s.to_lowercase().as_str() {
            "m1" | "1m" | "1min" => Ok(Timeframe::M1),
            "m5" | "5m" | "5min" => Ok(Timeframe::M5),
            "m15" | "15m" | "15min" => Ok(Timeframe::M15),
            "m30" | "30m" | "30min" => Ok(Timeframe::M30),
            "h1" | "1h" | "hour" => Ok(Timeframe::H1),
            "h4" | "4h" => Ok(Timeframe::H4),
            "d1" | "1d" | "daily" => Ok(Timeframe::D1),
            "w1" | "1w" | "weekly" => Ok(Timeframe::W1),
            "mn1" | "monthly" => Ok(Timeframe::MN1),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse() {
        assert_eq!(Timeframe::from_str("M15").unwrap(), Timeframe::M15);
        assert_eq!(Timeframe::from_str("15m").unwrap(), Timeframe::M15);
        assert_eq!(Timeframe::from_str("MN1").unwrap(), Timeframe::MN1);
        assert_eq!(Timeframe::from_str("m1").unwrap(), Timeframe::M1);
        assert!(Timeframe::from_str("M7").is_err());
    }

    #[test]
    fn test_timeframe_serde_uses_terminal_codes() {
        let json = serde_json::to_string(&Timeframe::H4).unwrap();
        assert_eq!(json, "\"H4\"");
        let back: Timeframe = serde_json::from_str("\"D1\"").unwrap();
        assert_eq!(back, Timeframe::D1);
    }
}
