//! Terminal integrations and order execution.

mod executor;
mod paper;

pub use executor::{OrderManager, OrderManagerConfig};
pub use paper::{default_symbol_info, PaperTerminal, PaperTerminalConfig};
