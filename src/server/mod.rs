//! HTTP ingestion API.
//!
//! ```text
//! GET  /                 liveness banner and version
//! POST /events           route, distill and store an event
//! GET  /context?query=   keyword search with optional re-ranking
//! POST /reset            clear the context store
//! ```

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::ONLINE_STATUS;

use crate::config::ServerConfig;
use crate::services::IngestionService;
use crate::{Error, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Builds the API router around a service.
#[must_use]
pub fn app(service: IngestionService, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/", get(handlers::health))
        .route("/events", post(handlers::post_event))
        .route("/context", get(handlers::get_context))
        .route("/reset", post(handlers::reset))
        .with_state(service)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ));

    let router = if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, the port cannot be bound, or
/// the server fails.
pub async fn serve(service: IngestionService, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| Error::InvalidInput(format!("server address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "bind".to_string(),
            cause: format!("{addr}: {e}"),
        })?;

    tracing::info!(
        %addr,
        store = service.store_name(),
        cors = config.cors,
        "TraceContext orchestrator listening"
    );

    axum::serve(listener, app(service, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "serve".to_string(),
            cause: e.to_string(),
        })?;

    tracing::info!("TraceContext orchestrator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
