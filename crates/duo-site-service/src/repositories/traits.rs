use crate::models::ContentRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("response body is not a row list: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status of a non-success response, if that is what failed.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// Where gallery records come from. Every call is a fresh round trip.
#[async_trait]
pub trait RecordSource: Clone + Send + Sync + 'static {
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>, FetchError>;
}
