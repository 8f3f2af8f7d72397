//! Post-commit hook installation.

use crate::{Error, Result};
use git2::Repository;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Marker line identifying a hook written by TraceContext.
pub const HOOK_MARKER: &str = "# TraceContext post-commit hook";

/// Result of installing the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledHook {
    /// Path of the written hook.
    pub path: PathBuf,
    /// True if a hook not written by TraceContext was replaced.
    pub replaced_foreign: bool,
}

/// Installs the post-commit hook in the repository containing `path`.
///
/// The hook runs `<current exe> hook post-commit` in the background, so a
/// slow or offline orchestrator never delays the commit.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `path` is not inside a git repository
/// or an existing hook was not written by TraceContext and `force` is false.
/// Returns [`Error::OperationFailed`] if the hook cannot be written.
pub fn install_post_commit_hook(path: &Path, force: bool) -> Result<InstalledHook> {
    let exe = std::env::current_exe().map_err(|e| Error::OperationFailed {
        operation: "current_exe".to_string(),
        cause: e.to_string(),
    })?;
    install_hook(path, force, &exe)
}

fn install_hook(path: &Path, force: bool, exe: &Path) -> Result<InstalledHook> {
    let repo = Repository::discover(path).map_err(|e| {
        Error::InvalidInput(format!("{} is not a git repository: {e}", path.display()))
    })?;

    let hooks_dir = repo.path().join("hooks");
    fs::create_dir_all(&hooks_dir).map_err(|e| write_error("create_hooks_dir", &e))?;
    let hook_path = hooks_dir.join("post-commit");

    let replaced_foreign = match fs::read(&hook_path) {
        Ok(existing) if contains_marker(&existing) => false,
        Ok(_) if force => true,
        Ok(_) => {
            return Err(Error::InvalidInput(format!(
                "{} already exists and was not written by TraceContext (use --force to replace it)",
                hook_path.display()
            )));
        },
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(write_error("read_hook", &e)),
    };

    fs::write(&hook_path, hook_script(exe)).map_err(|e| write_error("write_hook", &e))?;
    make_executable(&hook_path)?;

    tracing::info!(hook = %hook_path.display(), replaced_foreign, "Post-commit hook installed");
    Ok(InstalledHook {
        path: hook_path,
        replaced_foreign,
    })
}

/// Hooks may be in any encoding, so the marker is matched on raw bytes.
fn contains_marker(contents: &[u8]) -> bool {
    contents
        .windows(HOOK_MARKER.len())
        .any(|window| window == HOOK_MARKER.as_bytes())
}

/// Renders the hook script for an executable path.
#[must_use]
pub fn hook_script(exe: &Path) -> String {
    format!(
        "#!/bin/sh\n\
         {HOOK_MARKER}\n\
         # Forwards the new commit to the TraceContext orchestrator.\n\
         {} hook post-commit >/dev/null 2>&1 &\n\
         exit 0\n",
        shell_quote(&exe.display().to_string())
    )
}

/// Single-quotes a word for `/bin/sh`; nothing inside is expanded.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', "'\\''"))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| write_error("chmod_hook", &e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn write_error(operation: &str, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}
