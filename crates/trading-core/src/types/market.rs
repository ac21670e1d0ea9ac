//! Terminal-side market and account information.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// Latest tick for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    /// Last traded price
    pub last: f64,
    /// Unix timestamp in milliseconds (0 = no tick yet)
    pub timestamp: i64,
}

impl Quote {
    /// Get the mid price.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Get the spread.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Spread in pips for a 4/5-digit pair.
    pub fn spread_pips(&self) -> f64 {
        self.spread() * 10_000.0
    }

    /// Price a market order in `direction` would be priced at.
    pub fn entry_price(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.ask,
            Direction::Short => self.bid,
        }
    }

    /// A quote with a timestamp has real market data behind it.
    pub fn is_live(&self) -> bool {
        self.timestamp > 0
    }
}

/// Trading properties of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    /// Smallest price increment
    pub point: f64,
    pub digits: u32,
    /// Account-currency value of one tick per lot
    pub trade_tick_value: Decimal,
    pub volume_min: Decimal,
    pub volume_max: Decimal,
    /// Shown in Market Watch
    pub visible: bool,
}

/// Account summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: u64,
    pub balance: Decimal,
    pub equity: Decimal,
    pub currency: String,
}

/// Identification of the connected terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalInfo {
    pub company: String,
    pub server: String,
    pub connected: bool,
}

/// A position the terminal closed at its stop-loss or take-profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedDeal {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: Decimal,
    pub open_price: f64,
    pub close_price: f64,
    pub profit: Decimal,
    /// Unix timestamp in milliseconds
    pub closed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_pricing() {
        let quote = Quote {
            symbol: "EURUSD".into(),
            bid: 1.10500,
            ask: 1.10512,
            last: 1.10506,
            timestamp: 1,
        };

        assert!((quote.spread_pips() - 1.2).abs() < 1e-6);
        assert_eq!(quote.entry_price(Direction::Long), 1.10512);
        assert_eq!(quote.entry_price(Direction::Short), 1.10500);
        assert!(quote.is_live());
    }
}
