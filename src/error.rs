//! Error types for the share_file crate.

use thiserror::Error;

/// Errors that can occur when talking to the file-sharing service.
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Login failed: {0}")]
    Login(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file URL: {0}")]
    InvalidFileUrl(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

impl ShareError {
    /// Build a [`ShareError::Request`] for `endpoint`.
    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ShareError::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Error raised when an operation needs a user session and none is attached.
    pub fn no_user() -> Self {
        ShareError::Precondition("no user attached".to_string())
    }
}

/// Result type alias for ShareError.
pub type Result<T> = std::result::Result<T, ShareError>;
