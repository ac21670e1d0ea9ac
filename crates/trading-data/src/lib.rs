//! Market data: CSV history and the per-cycle snapshot fetcher.

mod csv_source;
mod fetcher;

pub use csv_source::{load_file, parse_timestamp, CsvDataSource};
pub use fetcher::{FetcherConfig, MarketData, MarketDataFetcher};
