use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Mount point with id \"{0}\" not found")]
    MountPointMissing(String),

    #[error("Items per page must be a positive integer")]
    InvalidPageSize,

    #[error("Invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("Invalid sheet endpoint: {0}")]
    InvalidEndpoint(#[from] crate::validation::ValidationError),

    #[error("Could not build HTTP client: {0}")]
    HttpClient(#[from] crate::repositories::FetchError),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Content is not available yet")]
    ContentUnavailable,

    #[error("Content could not be loaded")]
    LoadFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::ContentUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::LoadFailed(ref detail) => {
                // Log the detailed error but don't expose it to the client
                error!(error = %detail, "Content load failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
