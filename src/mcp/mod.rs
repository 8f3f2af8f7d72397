//! MCP server implementation.
//!
//! Exposes the context store to AI coding tools through the Model Context
//! Protocol. The server is a thin client of a running orchestrator.
//!
//! ## Features
//!
//! - **Tools**: `search_context`, `add_decision`, `add_dead_end`
//! - **Resources**: every stored record via `tracecontext://active-context`
//!
//! ## Claude Desktop Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "tracecontext": {
//!       "command": "tracecontext",
//!       "args": ["mcp"],
//!       "env": { "ORCHESTRATOR_URL": "http://localhost:8000" }
//!     }
//!   }
//! }
//! ```

// Allow ok_or with function calls - the error path is uncommon.
#![allow(clippy::or_fun_call)]

mod dispatch;
mod resources;
mod server;
#[cfg(test)]
mod testing;
mod tools;

pub use dispatch::{
    INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, McpMethod, PARSE_ERROR,
};
pub use resources::{ACTIVE_CONTEXT_URI, ResourceContent, ResourceDefinition};
pub use server::{INSTRUCTIONS, McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use tools::{
    MCP_SOURCE, NO_RECORDS_MESSAGE, OFFLINE_MESSAGE, ToolContent, ToolDefinition, ToolResult,
};
