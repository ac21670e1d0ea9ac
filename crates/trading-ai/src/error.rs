use thiserror::Error;
use trading_core::error::ProviderError;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AiResult<T> = Result<T, AiError>;

impl From<AiError> for ProviderError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::RequestFailed(e) => ProviderError::Request(e.to_string()),
            AiError::ServiceUnavailable(msg) | AiError::MissingApiKey(msg) => {
                ProviderError::Unavailable(msg)
            }
            AiError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
            AiError::Serialization(e) => ProviderError::InvalidResponse(e.to_string()),
            other => ProviderError::Unavailable(other.to_string()),
        }
    }
}
