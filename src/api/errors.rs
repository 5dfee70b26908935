//! Error types for the forum API client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not logged in")]
    Unauthorized,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request was interrupted")]
    Interrupted,
}

impl ApiError {
    /// Whether the server rejected the request because there is no valid session
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Unauthorized => true,
            ApiError::Status { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
