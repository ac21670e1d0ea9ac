//! CLI command implementations.

pub mod backtest;
pub mod decide;
pub mod journal;
pub mod run;
pub mod strategies;
pub mod validate;
