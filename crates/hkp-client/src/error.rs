//! Client error types

use hkp_core::{BoxError, DecodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Key not found")]
    NotFound,

    #[error("Refusing to connect to non-HTTPS keyserver ({scheme})")]
    InsecureScheme { scheme: String },

    #[error("Invalid keyserver host: {0}")]
    InvalidHost(String),

    #[error("Temporary failure resolving keyserver: {0}")]
    ResolveTransient(String),

    #[error("Failed to resolve keyserver: {0}")]
    ResolveFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid index: {0}")]
    Index(#[from] DecodeError),

    #[error("Armor error: {0}")]
    Armor(#[source] BoxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::ResolveTransient(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
