//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error returned by a handler.
///
/// Every variant renders as a 500 with an `{"error": "..."}` body. Agent
/// failures never get here; only store and task failures do.
#[derive(Debug)]
pub enum ApiError {
    /// A store or service operation failed.
    Service(crate::Error),
    /// The blocking task panicked or was cancelled.
    Task(String),
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        Self::Service(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Service(err) => err.to_string(),
            Self::Task(cause) => format!("request task failed: {cause}"),
        };
        tracing::error!(error = %message, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
