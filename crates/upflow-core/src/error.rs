//! Error types for resource resolution and creation

use thiserror::Error;

/// Errors surfaced by the `up` flow.
///
/// User input problems are reported immediately and never retried.
/// Platform errors raised while creating resources are passed through
/// unmodified.
#[derive(Error, Debug)]
pub enum UpError {
    #[error("{0}")]
    RequiredArgumentMissing(String),

    #[error("{0}")]
    MutuallyExclusiveArguments(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidArgumentValue(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UpError>;

/// Errors returned by the control-plane collaborators
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
