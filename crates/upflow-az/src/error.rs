//! Azure adapter error types

use thiserror::Error;
use upflow_core::PlatformError;

#[derive(Error, Debug)]
pub enum AzError {
    #[error("az CLI not found. Please install: https://aka.ms/installazurecli")]
    AzNotFound,

    #[error("Not logged in: {0}. Run `az login` first")]
    NotLoggedIn(String),

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzError>;

impl From<AzError> for PlatformError {
    fn from(e: AzError) -> Self {
        match e {
            AzError::NotFound(what) => PlatformError::NotFound(what),
            AzError::NotLoggedIn(msg) => PlatformError::AuthenticationFailed(msg),
            AzError::Timeout(what) => PlatformError::Timeout(what),
            AzError::Json(e) => PlatformError::Json(e),
            AzError::Io(e) => PlatformError::Io(e),
            AzError::AzNotFound | AzError::CommandFailed(_) => {
                PlatformError::CommandFailed(e.to_string())
            }
            AzError::GitHub(_) | AzError::Http(_) => PlatformError::Api(e.to_string()),
        }
    }
}
