//! Reading the HEAD commit.

use crate::models::{Event, EventKind};
use crate::{Error, Result};
use git2::{DiffFormat, Repository};
use std::path::Path;

/// The HEAD commit of a repository, as forwarded by the post-commit hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSnapshot {
    /// Full commit hash.
    pub id: String,
    /// Commit message, trailing whitespace trimmed.
    pub message: String,
    /// Unified diff against the first parent (or the empty tree).
    pub diff: String,
    /// Author name.
    pub author: String,
    /// URL of the `origin` remote, if configured.
    pub remote_url: Option<String>,
}

impl CommitSnapshot {
    /// Converts the snapshot into a code-change event.
    #[must_use]
    pub fn into_event(self) -> Event {
        let mut event = Event::new(EventKind::CodeChange)
            .with_data("message", self.message)
            .with_data("diff", self.diff)
            .with_metadata("user", self.author)
            .with_metadata("commit", self.id);
        if let Some(url) = self.remote_url {
            event = event.with_metadata("repo", url);
        }
        event
    }
}

/// Reads the HEAD commit of the repository containing `path`.
///
/// # Errors
///
/// Returns an error if there is no repository, HEAD is unborn, or the diff
/// cannot be computed.
pub fn read_head_commit(path: &Path) -> Result<CommitSnapshot> {
    let repo = Repository::discover(path).map_err(|e| git_error("open_repository", &e))?;
    let commit = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(|e| git_error("get_head", &e))?;

    let tree = commit.tree().map_err(|e| git_error("get_tree", &e))?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(|e| git_error("get_parent_tree", &e))?),
        Err(_) => None,
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(|e| git_error("diff_tree", &e))?;

    let mut patch = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            patch.push(line.origin());
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| git_error("print_diff", &e))?;

    let remote_url = repo
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(ToString::to_string));

    Ok(CommitSnapshot {
        id: commit.id().to_string(),
        message: commit.message().unwrap_or_default().trim_end().to_string(),
        diff: patch,
        author: commit.author().name().unwrap_or("unknown").to_string(),
        remote_url,
    })
}

fn git_error(operation: &str, e: &git2::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.message().to_string(),
    }
}
