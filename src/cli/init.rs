//! Init command: installs the git post-commit hook.

use crate::git::install_post_commit_hook;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Installs the hook in the repository containing `repo`.
///
/// # Errors
///
/// Returns an error if `repo` is not in a git repository, a foreign hook is
/// in the way without `force`, or output fails.
pub fn cmd_init<W: Write>(repo: &Path, force: bool, out: &mut W) -> Result<()> {
    let installed = install_post_commit_hook(repo, force)?;

    if installed.replaced_foreign {
        writeln!(out, "Replaced existing post-commit hook.").map_err(output_error)?;
    }
    writeln!(out, "TraceContext initialized successfully!").map_err(output_error)?;
    writeln!(out, "Git post-commit hook installed at {}", installed.path.display())
        .map_err(output_error)?;
    writeln!(
        out,
        "Commits are forwarded to the orchestrator; start it with: tracecontext serve"
    )
    .map_err(output_error)?;
    Ok(())
}

pub(super) fn output_error(e: std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}
