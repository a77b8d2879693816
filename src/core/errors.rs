use crate::browser::BrowserError;
use crate::storage::StorageError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Browser error: {0}")]
    BrowserError(#[from] BrowserError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { timeout: Duration, what: String },

    #[error("Pipeline panicked: {0}")]
    Panicked(String),
}

impl ScraperError {
    pub fn timeout(timeout: Duration, what: impl Into<String>) -> Self {
        ScraperError::Timeout {
            timeout,
            what: what.into(),
        }
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;
