//! Append-only trade journal, one JSON line per decision.

use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use trading_core::types::{ExecutionResult, ExecutionStatus, Quote, TradeDecision};

/// Market state when the decision was executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub spread: f64,
    pub last_price: f64,
}

impl From<&Quote> for MarketConditions {
    fn from(quote: &Quote) -> Self {
        Self {
            spread: quote.spread(),
            last_price: quote.last,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeContext {
    pub balance: Decimal,
    /// Missing when the terminal had no quote
    #[serde(default)]
    pub market_conditions: Option<MarketConditions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub symbol: String,
    pub decision: TradeDecision,
    pub result: ExecutionResult,
    pub context: TradeContext,
}

impl JournalEntry {
    /// Stamp an entry with the current local time.
    pub fn now(
        symbol: &str,
        decision: TradeDecision,
        result: ExecutionResult,
        context: TradeContext,
    ) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            symbol: symbol.to_string(),
            decision,
            result,
            context,
        }
    }
}

/// Writes entries to `{log_dir}/{SYMBOL}_{YYYY-MM-DD}.json`.
#[derive(Debug, Clone)]
pub struct TradeJournal {
    log_dir: PathBuf,
}

impl TradeJournal {
    pub fn new(log_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let log_dir = log_dir.into();
        fs::create_dir_all(&log_dir)?;
        Ok(Self { log_dir })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// File the entry lands in, dated by local time.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.log_dir
            .join(format!("{}_{}.json", symbol, Local::now().format("%Y-%m-%d")))
    }

    /// Append an entry. Failures are logged and swallowed.
    pub fn record(&self, entry: &JournalEntry) {
        match self.append(entry) {
            Ok(()) => info!(
                symbol = %entry.symbol,
                status = %entry.result.status,
                timestamp = %entry.timestamp,
                "Logged trade"
            ),
            Err(e) => warn!(symbol = %entry.symbol, error = %e, "Failed to log trade"),
        }
    }

    fn append(&self, entry: &JournalEntry) -> io::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(&entry.symbol))?;
        writeln!(file, "{}", line)
    }
}

/// Read every `.json` journal file in `dir`, oldest entry first.
///
/// Lines that do not parse are skipped with a warning.
pub fn load_entries(dir: &Path) -> io::Result<Vec<JournalEntry>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for file in fs::read_dir(dir)? {
        let path = file?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let reader = BufReader::new(fs::File::open(&path)?);
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    file = %path.display(),
                    line = n + 1,
                    error = %e,
                    "Skipping corrupted journal line"
                ),
            }
        }
    }

    entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    Ok(entries)
}

/// Per-symbol tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub decisions: usize,
    pub executed: usize,
    pub errors: usize,
    pub profit: Decimal,
}

/// Aggregate view over journal entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalSummary {
    pub entries: usize,
    pub executed: usize,
    pub adjusted: usize,
    pub hold: usize,
    pub errors: usize,
    pub total_profit: Decimal,
    pub symbols: BTreeMap<String, SymbolSummary>,
    /// `(timestamp, profit)` per entry; entries without a profit count as zero
    pub profit_series: Vec<(String, Decimal)>,
}

impl JournalSummary {
    pub fn from_entries(entries: &[JournalEntry]) -> Self {
        let mut summary = Self {
            entries: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            let profit = entry.result.profit.unwrap_or(Decimal::ZERO);
            let symbol = summary.symbols.entry(entry.symbol.clone()).or_default();
            symbol.decisions += 1;
            symbol.profit += profit;

            match entry.result.status {
                ExecutionStatus::Executed => {
                    summary.executed += 1;
                    symbol.executed += 1;
                }
                ExecutionStatus::Adjusted => summary.adjusted += 1,
                ExecutionStatus::Hold => summary.hold += 1,
                ExecutionStatus::Error => {
                    summary.errors += 1;
                    symbol.errors += 1;
                }
            }

            summary.total_profit += profit;
            summary.profit_series.push((entry.timestamp.clone(), profit));
        }
        summary
    }
}
