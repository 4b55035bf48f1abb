use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentryLensError {
    #[error("API request failed: {status} - {body}")]
    Api { status: StatusCode, body: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Summary cache error: {0}")]
    Cache(String),
}

impl SentryLensError {
    /// Network failures and non-2xx responses are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, SentryLensError>;
