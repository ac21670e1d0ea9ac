//! Core traits for the trading system.

mod broker;
mod data_source;
mod provider;
mod strategy;

pub use broker::Broker;
pub use data_source::DataSource;
pub use provider::DecisionProvider;
pub use strategy::{RuleSignal, Strategy, StrategyConfig};
