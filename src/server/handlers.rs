//! Route handlers.
//!
//! The service is synchronous (provider clients are blocking reqwest), so
//! every handler that touches it hops onto the blocking pool.

use super::error::ApiError;
use crate::models::Event;
use crate::services::IngestionService;
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Fixed liveness banner.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Body of `POST /events`.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Always `received`.
    pub status: &'static str,
    /// Identifier of the stored record.
    pub event_id: String,
    /// Canonical event kind.
    pub kind: String,
    /// True if the stored record is a placeholder.
    pub degraded: bool,
}

/// Query string of `GET /context`.
#[derive(Debug, Default, Deserialize)]
pub struct ContextParams {
    /// Free-text task description.
    pub query: Option<String>,
}

/// Body of `GET /context`.
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    /// Formatted records in response order.
    pub context: Vec<String>,
    /// The query, echoed when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Body of `POST /reset`.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Human-readable confirmation.
    pub message: String,
    /// Number of removed records.
    pub cleared: usize,
}

/// Banner returned by `GET /`.
pub const ONLINE_STATUS: &str = "TraceContext Orchestrator Online";

/// `GET /`: liveness banner and crate version.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: ONLINE_STATUS,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /events`: routes, distills and stores one event.
pub async fn post_event(
    State(service): State<IngestionService>,
    Json(event): Json<Event>,
) -> Result<Json<EventResponse>, ApiError> {
    let receipt = tokio::task::spawn_blocking(move || service.ingest(event)).await??;
    Ok(Json(EventResponse {
        status: "received",
        event_id: receipt.event_id,
        kind: receipt.kind,
        degraded: receipt.degraded,
    }))
}

/// `GET /context`: keyword search, re-ranked when enabled. The query is
/// trimmed; a blank query returns the whole store.
pub async fn get_context(
    State(service): State<IngestionService>,
    Query(params): Query<ContextParams>,
) -> Result<Json<ContextResponse>, ApiError> {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    let task_query = query.clone();
    let result = tokio::task::spawn_blocking(move || service.query(task_query.as_deref())).await??;
    Ok(Json(ContextResponse {
        context: result.formatted(),
        query,
    }))
}

/// `POST /reset`: clears the store.
pub async fn reset(State(service): State<IngestionService>) -> Result<Json<ResetResponse>, ApiError> {
    let cleared = tokio::task::spawn_blocking(move || service.reset()).await??;
    Ok(Json(ResetResponse {
        status: "ok",
        message: "Context store cleared.".to_string(),
        cleared,
    }))
}
