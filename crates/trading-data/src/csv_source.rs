//! CSV candle history.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{Bar, Timeframe};

/// CSV record format. Terminal exports name the time column `time` and the
/// volume `tick_volume`.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Time",
        alias = "date",
        alias = "Date",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    time: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "tick_volume", alias = "Volume", default)]
    volume: f64,
}

/// Directory of per-symbol CSV files.
///
/// For `EURUSD` on `M15` the newest `EURUSD_M15*.csv` is used, falling
/// back to `EURUSD.csv`.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DataError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(DataError::NoDataAvailable(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate the file backing `symbol` on `timeframe`.
    pub fn resolve(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<PathBuf>, DataError> {
        let prefix = format!("{}_{}", symbol, timeframe.code());
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with(&prefix) && name.ends_with(".csv")) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, entry.path()));
            }
        }

        if let Some((_, path)) = newest {
            return Ok(Some(path));
        }
        let plain = self.dir.join(format!("{}.csv", symbol));
        Ok(plain.is_file().then_some(plain))
    }

    /// Load every bar of a symbol, oldest first.
    pub fn load_all(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, DataError> {
        let path = self
            .resolve(symbol, timeframe)?
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
        debug!(symbol, path = %path.display(), "Loading bars");
        load_file(&path)
    }
}

/// Load bars from one CSV file, sorted by time.
pub fn load_file(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        bars.push(Bar::new(
            parse_timestamp(&record.time)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Parse a timestamp into Unix milliseconds.
pub fn parse_timestamp(value: &str) -> Result<i64, DataError> {
    const DATETIME_FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
    ];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%m/%d/%Y"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix seconds, or milliseconds past 10 digits
    if let Ok(ts) = value.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", value)))
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let mut bars = self.load_all(symbol, timeframe)?;
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable(symbol.to_string()));
        }
        let skip = bars.len().saturating_sub(count);
        Ok(bars.split_off(skip))
    }

    async fn has_symbol(&self, symbol: &str) -> Result<bool, DataError> {
        if self.dir.join(format!("{}.csv", symbol)).is_file() {
            return Ok(true);
        }
        let prefix = format!("{}_", symbol);
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".csv") {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn name(&self) -> &str {
        "CSV"
    }
}
