//! Error types for the session API.
//!
//! [`ApiError`] converts into an Axum response with a JSON body of the form
//! `{ "error": ..., "status": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use genie_core::SessionError;
use tokio::task::JoinError;

/// Errors returned by the session API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The referenced token does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body, path, or submitted word is invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The session cannot accept the request right now.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The task running the session flow failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownToken(_) => Self::NotFound(err.to_string()),
            SessionError::InvalidWord(_) | SessionError::InvalidPosition => {
                Self::BadRequest(err.to_string())
            }
            SessionError::InputLocked => Self::Conflict(err.to_string()),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Internal(format!("session task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg,
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
