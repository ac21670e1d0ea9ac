//! The decision engine.
//!
//! This crate turns indicator snapshots into trade decisions:
//! - Trend Following (EMA stack + ADX + RSI)
//! - Mean Reversion (Bollinger Bands + RSI)
//! - Breakout (ATR expansion)
//!
//! Rules are evaluated in that order by [`DecisionEngine`]. External
//! providers are wrapped in [`GuardedProvider`] for validation, retries and
//! the safe fallback.

mod breakout;
mod engine;
mod guard;
mod mean_reversion;
mod provider;
mod registry;
mod trend_following;
mod validation;

pub use breakout::{BreakoutConfig, BreakoutStrategy};
pub use engine::{DecisionEngine, EngineConfig};
pub use guard::{GuardConfig, GuardedProvider};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use provider::RuleProvider;
pub use registry::{StrategyInfo, StrategyRegistry};
pub use trend_following::{TrendFollowingConfig, TrendFollowingStrategy};
pub use validation::DecisionValidator;
