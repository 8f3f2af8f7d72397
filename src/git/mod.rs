//! Git integration.
//!
//! Installs the post-commit hook and turns the HEAD commit into a
//! code-change event.

mod commit;
mod hook;

pub use commit::{CommitSnapshot, read_head_commit};
pub use hook::{HOOK_MARKER, InstalledHook, hook_script, install_post_commit_hook};
