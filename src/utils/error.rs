use thiserror::Error;

use crate::models::Source;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Adapter error: {source_tag}: {message}")]
    Adapter { source_tag: Source, message: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Capacity error: watchlist limit of {limit} reached for {email}")]
    Capacity { email: String, limit: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

impl AppError {
    /// Whether a caller-driven retry of the failed operation is safe.
    /// The engine itself never retries: a retried fetch that actually
    /// succeeded the first time would advance a pagination cursor twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Fetch(_) | AppError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
