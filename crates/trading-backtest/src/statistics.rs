//! Backtest statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::types::{ClosedDeal, Direction, ExecutionStatus};

/// Record of a single closed trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: Decimal,
    pub open_price: f64,
    pub close_price: f64,
    pub profit: Decimal,
    pub closed_at: DateTime<Utc>,
}

impl From<ClosedDeal> for TradeRecord {
    fn from(deal: ClosedDeal) -> Self {
        Self {
            ticket: deal.ticket,
            symbol: deal.symbol,
            direction: deal.direction,
            volume: deal.volume,
            open_price: deal.open_price,
            close_price: deal.close_price,
            profit: deal.profit,
            closed_at: DateTime::from_timestamp_millis(deal.closed_at).unwrap_or_default(),
        }
    }
}

/// How the execution side handled each decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub executed: usize,
    pub adjusted: usize,
    pub hold: usize,
    pub error: usize,
}

impl DecisionCounts {
    pub fn record(&mut self, status: ExecutionStatus) {
        match status {
            ExecutionStatus::Executed => self.executed += 1,
            ExecutionStatus::Adjusted => self.adjusted += 1,
            ExecutionStatus::Hold => self.hold += 1,
            ExecutionStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.executed + self.adjusted + self.hold + self.error
    }
}

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    /// Sum of closed-trade profit
    pub net_profit: Decimal,
    pub total_return_pct: Decimal,
    /// Largest peak-to-trough equity drop, in percent
    pub max_drawdown_pct: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    /// Gross profit over gross loss
    pub profit_factor: Decimal,
    pub bars_processed: usize,
    pub decisions: DecisionCounts,
    pub equity_curve: Vec<(i64, Decimal)>,
    pub trades: Vec<TradeRecord>,
    peak_equity: Decimal,
}

impl BacktestStats {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            final_balance: initial_balance,
            net_profit: Decimal::ZERO,
            total_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            bars_processed: 0,
            decisions: DecisionCounts::default(),
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: initial_balance,
        }
    }

    /// Record equity after a bar.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        self.equity_curve.push((timestamp, equity));

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    pub fn add_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
        self.total_trades += 1;
    }

    /// Derive the summary figures from the recorded trades.
    pub fn finalize(&mut self, final_balance: Decimal) {
        self.final_balance = final_balance;
        if self.initial_balance > Decimal::ZERO {
            self.total_return_pct =
                (final_balance - self.initial_balance) / self.initial_balance * dec!(100);
        }

        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        self.winning_trades = 0;
        self.losing_trades = 0;

        for trade in &self.trades {
            if trade.profit > Decimal::ZERO {
                self.winning_trades += 1;
                gross_profit += trade.profit;
            } else if trade.profit < Decimal::ZERO {
                self.losing_trades += 1;
                gross_loss += trade.profit.abs();
            }
        }
        self.net_profit = gross_profit - gross_loss;

        if self.total_trades > 0 {
            self.win_rate_pct =
                Decimal::from(self.winning_trades * 100) / Decimal::from(self.total_trades);
        }
        if self.winning_trades > 0 {
            self.avg_win = gross_profit / Decimal::from(self.winning_trades);
        }
        if self.losing_trades > 0 {
            self.avg_loss = gross_loss / Decimal::from(self.losing_trades);
        }
        if gross_loss > Decimal::ZERO {
            self.profit_factor = gross_profit / gross_loss;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(profit: Decimal) -> TradeRecord {
        TradeRecord {
            ticket: 1,
            symbol: "EURUSD".into(),
            direction: Direction::Long,
            volume: dec!(0.1),
            open_price: 1.1,
            close_price: 1.1,
            profit,
            closed_at: DateTime::from_timestamp_millis(0).unwrap_or_default(),
        }
    }

    #[test]
    fn test_finalize() {
        let mut stats = BacktestStats::new(dec!(10000));
        stats.add_trade(trade(dec!(150)));
        stats.add_trade(trade(dec!(-50)));
        stats.add_trade(trade(dec!(-25)));
        stats.add_trade(trade(dec!(75)));
        stats.finalize(dec!(10150));

        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.net_profit, dec!(150));
        assert_eq!(stats.profit_factor, dec!(3));
        assert_eq!(stats.total_return_pct, dec!(1.5));
    }

    #[test]
    fn test_drawdown() {
        let mut stats = BacktestStats::new(dec!(10000));
        stats.record_equity(1, dec!(10000));
        stats.record_equity(2, dec!(11000));
        stats.record_equity(3, dec!(9900));
        stats.record_equity(4, dec!(10500));

        assert_eq!(stats.max_drawdown_pct, dec!(10));
        assert_eq!(stats.bars_processed, 4);
    }
}
