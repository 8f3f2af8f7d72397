//! MCP resources.

use super::tools::{NO_RECORDS_MESSAGE, OFFLINE_MESSAGE, RECORD_SEPARATOR};
use crate::client::OrchestratorApi;
use crate::{Error, Result};
use serde::Serialize;

/// URI of the resource holding every stored record.
pub const ACTIVE_CONTEXT_URI: &str = "tracecontext://active-context";

/// Definition of an MCP resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinition {
    /// Resource URI.
    pub uri: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Description shown to the client.
    pub description: &'static str,
    /// MIME type of the content.
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// Content of a read resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceContent {
    /// Resource URI.
    pub uri: String,
    /// MIME type of the text.
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    /// Resource text.
    pub text: String,
}

/// Lists every resource.
#[must_use]
pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![ResourceDefinition {
        uri: ACTIVE_CONTEXT_URI,
        name: "Active Persistent Context",
        description: "All TraceContext records for this codebase: ADRs, dead-ends and codebase \
            maps. Read at session start to be briefed before the first question.",
        mime_type: "text/markdown",
    }]
}

/// Reads a resource.
///
/// An unreachable orchestrator yields the offline hint as content.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unknown URI.
pub fn read_resource(api: &dyn OrchestratorApi, uri: &str) -> Result<ResourceContent> {
    if uri != ACTIVE_CONTEXT_URI {
        return Err(Error::InvalidInput(format!("Resource not found: {uri}")));
    }

    let text = match api.context(None) {
        Ok(records) if records.is_empty() => NO_RECORDS_MESSAGE.to_string(),
        Ok(records) => records.join(RECORD_SEPARATOR),
        Err(Error::Unavailable(_)) => OFFLINE_MESSAGE.to_string(),
        Err(e) => format!("[TraceContext] Error: {e}"),
    };

    Ok(ResourceContent {
        uri: uri.to_string(),
        mime_type: "text/markdown",
        text,
    })
}
