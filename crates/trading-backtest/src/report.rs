//! Backtest report generation.

use serde::{Deserialize, Serialize};

use crate::{BacktestConfig, BacktestStats};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Provider that made the decisions
    pub provider: String,
    pub config: BacktestConfig,
    pub stats: BacktestStats,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let s = &self.stats;
        let mut out = String::new();

        out.push_str("═══════════════════════════════════════════════════════════\n");
        out.push_str("                     BACKTEST REPORT                        \n");
        out.push_str("═══════════════════════════════════════════════════════════\n\n");
        out.push_str(&format!("  Provider:            {}\n\n", self.provider));

        out.push_str("PERFORMANCE\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Initial Balance:     ${:.2}\n", s.initial_balance));
        out.push_str(&format!("  Final Balance:       ${:.2}\n", s.final_balance));
        out.push_str(&format!("  Net Profit:          ${:.2}\n", s.net_profit));
        out.push_str(&format!("  Total Return:        {:.2}%\n", s.total_return_pct));
        out.push_str(&format!("  Max Drawdown:        {:.2}%\n", s.max_drawdown_pct));
        out.push_str(&format!("  Profit Factor:       {:.2}\n", s.profit_factor));
        out.push('\n');

        out.push_str("TRADE STATISTICS\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Total Trades:        {}\n", s.total_trades));
        out.push_str(&format!("  Winning Trades:      {}\n", s.winning_trades));
        out.push_str(&format!("  Losing Trades:       {}\n", s.losing_trades));
        out.push_str(&format!("  Win Rate:            {:.2}%\n", s.win_rate_pct));
        out.push_str(&format!("  Avg Win:             ${:.2}\n", s.avg_win));
        out.push_str(&format!("  Avg Loss:            ${:.2}\n", s.avg_loss));
        out.push('\n');

        out.push_str("DECISIONS\n");
        out.push_str("───────────────────────────────────────────────────────────\n");
        out.push_str(&format!("  Bars Processed:      {}\n", s.bars_processed));
        out.push_str(&format!("  Executed:            {}\n", s.decisions.executed));
        out.push_str(&format!("  Adjusted:            {}\n", s.decisions.adjusted));
        out.push_str(&format!("  Hold:                {}\n", s.decisions.hold));
        out.push_str(&format!("  Errors:              {}\n", s.decisions.error));
        out.push('\n');

        out.push_str("═══════════════════════════════════════════════════════════\n");
        out
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the equity curve as CSV.
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            csv.push_str(&format!("{},{}\n", ts, equity));
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report() -> BacktestReport {
        let mut stats = BacktestStats::new(dec!(10000));
        stats.final_balance = dec!(10250);
        stats.total_return_pct = dec!(2.5);
        stats.total_trades = 4;
        stats.record_equity(1, dec!(10000));
        stats.record_equity(2, dec!(10250));

        BacktestReport {
            provider: "rules".into(),
            config: BacktestConfig::default(),
            stats,
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("Provider:            rules"));
        assert!(summary.contains("2.50%"));
        assert!(summary.contains("Total Trades:        4"));
    }

    #[test]
    fn test_exports() {
        let report = report();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["provider"], "rules");
        assert_eq!(report.equity_to_csv(), "timestamp,equity\n1,10000\n2,10250\n");
    }
}
