//! CLI command implementations.
//!
//! Each submodule implements one command. Commands write to a caller-supplied
//! writer so the binary owns stdout.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the HTTP ingestion API |
//! | `init` | Install the git post-commit hook |
//! | `status` | Check a running orchestrator |
//! | `search` | Search the context store |
//! | `reset` | Clear the context store |
//! | `mcp` | Run the MCP server on stdio |
//! | `hook post-commit` | Forward HEAD as a code-change event |
//! | `config` | Print the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! tracecontext serve --port 8000
//! tracecontext init
//! tracecontext search "why stripe"
//! ```

mod config;
mod hook;
mod init;
mod llm_factory;
mod serve;
mod status;

pub use config::cmd_config;
pub use hook::cmd_hook_post_commit;
pub use init::cmd_init;
pub use llm_factory::{build_anthropic_client, build_llm_provider, build_openai_client};
pub use serve::{build_service, cmd_serve};
pub use status::{OFFLINE_HINT, cmd_reset, cmd_search, cmd_status};
