//! Logging setup and the trade journal.

mod journal;
mod logging;

pub use journal::{
    load_entries, JournalEntry, JournalSummary, MarketConditions, SymbolSummary, TradeContext,
    TradeJournal,
};
pub use logging::setup_logging;
