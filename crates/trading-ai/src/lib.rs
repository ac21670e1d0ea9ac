//! External decision providers.
//!
//! Both providers implement [`DecisionProvider`](trading_core::DecisionProvider)
//! and are meant to run behind the strategies crate's guard, which
//! validates, retries and falls back:
//! - [`ChatCompletionProvider`] asks an OpenAI-compatible chat endpoint
//! - [`GradientBoostedProvider`] scores a JSON tree ensemble locally

pub mod error;
pub mod gbm;
pub mod llm;

pub use error::{AiError, AiResult};
pub use gbm::{GradientBoostedConfig, GradientBoostedModel, GradientBoostedProvider};
pub use llm::{ChatCompletionConfig, ChatCompletionProvider};
