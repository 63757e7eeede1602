//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hkp_core::BoxError;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Not Implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unreadable request body
    #[error("Request body error: {0}")]
    Body(String),

    #[error("Armor error: {0}")]
    Armor(#[source] BoxError),

    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Body(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Armor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for ServerError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => ServerError::NotFound,
            BackendError::Forbidden => ServerError::Forbidden,
            BackendError::Other(e) => ServerError::Backend(e),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::warn!(error = %self, "Request failed");
        }

        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
