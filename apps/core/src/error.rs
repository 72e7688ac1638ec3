use axum::http::StatusCode;
use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents standard input/output errors (temp files, tool invocation).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents errors specific to the actor system, such as communication failures.
    #[error("Actor error: {0}")]
    Actor(#[from] crate::actors::messages::ActorError),

    /// The language-model provider rejected the request or returned something unusable.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport-level HTTP failure while talking to a remote service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Represents data validation errors (e.g., invalid input format).
    /// The message is shown to callers as-is.
    #[error("{0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., missing environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be turned into text.
    #[error("File processing error: {0}")]
    Extraction(String),

    /// The uploaded file type is not one we can route.
    #[error("{0}")]
    UnsupportedMedia(String),

    /// The uploaded file is larger than the configured limit.
    #[error("{}", too_large_message(.size, .limit))]
    PayloadTooLarge { size: usize, limit: usize },

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// HTTP status used when this error reaches the transport layer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Provider(_) | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_)
            | AppError::Actor(_)
            | AppError::Config(_)
            | AppError::Extraction(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn too_large_message(size: &usize, limit: &usize) -> String {
    format!(
        "File size ({:.2}MB) exceeds maximum allowed size ({}MB)",
        *size as f64 / 1024.0 / 1024.0,
        limit / 1024 / 1024
    )
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Actor(e) => AppError::Actor(e.clone()),
            AppError::Provider(s) => AppError::Provider(s.clone()),
            AppError::Http(s) => AppError::Http(s.clone()),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Extraction(s) => AppError::Extraction(s.clone()),
            AppError::UnsupportedMedia(s) => AppError::UnsupportedMedia(s.clone()),
            AppError::PayloadTooLarge { size, limit } => AppError::PayloadTooLarge {
                size: *size,
                limit: *limit,
            },
            AppError::Internal(s) => AppError::Internal(s.clone()),
            AppError::Timeout(s) => AppError::Timeout(s.clone()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}
