//! # TraceContext
//!
//! Persistent architectural context for AI coding assistants.
//!
//! TraceContext ingests "code change" and "abandoned approach" events, asks an
//! LLM to distill each into an architecture decision record (ADR) or a
//! dead-end record, and keeps the formatted records in a searchable context
//! store. Search is a case-insensitive keyword match with optional LLM
//! re-ranking.
//!
//! ## Features
//!
//! - HTTP ingestion API (`POST /events`, `GET /context`, `POST /reset`)
//! - Agents that always produce a record, even without an LLM credential
//! - Pluggable context store (in-memory default, Redis, PostgreSQL)
//! - MCP server exposing the store to AI coding tools
//! - Git post-commit hook that forwards every commit as an event
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracecontext::services::{EventRouter, IngestionService, RankingAgent};
//! use tracecontext::storage::MemoryContextStore;
//! use tracecontext::{Event, EventKind};
//!
//! let service = IngestionService::new(
//!     EventRouter::unconfigured(),
//!     RankingAgent::new(None),
//!     Arc::new(MemoryContextStore::new()),
//! );
//! let receipt = service
//!     .ingest(Event::new(EventKind::CodeChange).with_data("message", "feat: add cache"))
//!     .unwrap();
//! assert!(receipt.degraded);
//! assert_eq!(service.query(None).unwrap().records.len(), 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod client;
pub mod config;
pub mod git;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod server;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::TraceContextConfig;
pub use llm::LlmProvider;
pub use models::{
    AgentOutcome, ContextChunk, ContextRecord, DeadEndRecord, DecisionRecord, DegradedReason,
    Event, EventKind, RecordId, RecordKind, RelevanceScore,
};
pub use services::{EventRouter, IngestionService, RankingAgent};
pub use storage::{ContextStore, MemoryContextStore};

/// Error type for tracecontext operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed config values, foreign git hook in the way, bad tool arguments |
/// | `OperationFailed` | LLM requests fail, store queries fail, git or filesystem errors |
/// | `Unavailable` | The orchestrator or a store backend cannot be reached |
/// | `FeatureNotEnabled` | A store backend is configured but its cargo feature is off |
///
/// LLM failures never reach HTTP callers: the agents absorb them into
/// degraded records.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A configuration value cannot be parsed
    /// - An MCP tool is called with missing or unknown arguments
    /// - `init` would overwrite a post-commit hook it did not write
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - An LLM provider returns an error status or unparseable output
    /// - A Redis or PostgreSQL query fails
    /// - Reading the git repository or writing the hook fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A remote collaborator could not be reached.
    ///
    /// Raised when the orchestrator HTTP API refuses the connection. Clients
    /// render this as an "offline" message rather than a hard failure.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Feature not enabled (requires feature flag).
    ///
    /// Raised when the configured store backend was not compiled in.
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

/// Result type alias for tracecontext operations.
pub type Result<T> = std::result::Result<T, Error>;
