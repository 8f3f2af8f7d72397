//! Hook command: forwards the HEAD commit to the orchestrator.

use crate::client::{EventAck, OrchestratorApi};
use crate::git::read_head_commit;
use crate::Result;
use std::path::Path;

/// Reads HEAD in `repo` and posts it as a code-change event.
///
/// Callers must not fail the commit on error: the binary logs the error
/// and exits 0.
///
/// # Errors
///
/// Returns an error if the commit cannot be read or the post fails.
pub fn cmd_hook_post_commit(api: &dyn OrchestratorApi, repo: &Path) -> Result<EventAck> {
    let snapshot = read_head_commit(repo)?;
    let commit = snapshot.id.clone();
    let ack = api.post_event(&snapshot.into_event())?;
    tracing::info!(%commit, event_id = %ack.event_id, degraded = ack.degraded, "Commit forwarded");
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HealthStatus;
    use crate::models::{Event, EventKind};
    use crate::Error;
    use git2::{Repository, Signature};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingApi {
        events: Mutex<Vec<Event>>,
    }

    impl OrchestratorApi for RecordingApi {
        fn health(&self) -> Result<HealthStatus> {
            Err(Error::Unavailable("unused".to_string()))
        }

        fn post_event(&self, event: &Event) -> Result<EventAck> {
            self.events.lock().unwrap().push(event.clone());
            Ok(EventAck {
                status: "received".to_string(),
                event_id: "e1".to_string(),
                kind: event.kind.to_string(),
                degraded: false,
            })
        }

        fn context(&self, _query: Option<&str>) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn reset(&self) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_forwards_head_commit() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let sig = Signature::now("test", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .unwrap();
        }

        let api = RecordingApi::default();
        let ack = cmd_hook_post_commit(&api, dir.path()).unwrap();
        assert_eq!(ack.event_id, "e1");

        let events = api.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CodeChange);
        assert_eq!(events[0].text_field("message"), "Initial commit");
    }

    #[test]
    fn test_no_repository_is_error() {
        let dir = TempDir::new().unwrap();
        let api = RecordingApi::default();
        assert!(cmd_hook_post_commit(&api, dir.path()).is_err());
        assert!(api.events.lock().unwrap().is_empty());
    }
}
