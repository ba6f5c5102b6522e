//! Error codes shared by every module that can fail in front of a user.
//!
//! DESIGN
//! ======
//! Each module owns a `thiserror` enum. Errors that reach an HTTP response
//! implement [`ErrorCode`] so the route layer can render a uniform
//! `{code, message, retryable}` body without inspecting variants.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Grepable error code plus retry hint for user-facing failures.
pub trait ErrorCode {
    /// Stable `E_*` identifier for the failure.
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same request may succeed.
    fn retryable(&self) -> bool {
        false
    }
}

/// JSON error body returned by API routes.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), retryable: false }
    }

    /// Wrap a coded error with the given HTTP status.
    #[must_use]
    pub fn from_error<E>(status: StatusCode, err: &E) -> Self
    where
        E: ErrorCode + std::fmt::Display,
    {
        Self { status, code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
