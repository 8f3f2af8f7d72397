//! In-memory orchestrator for MCP unit tests.

use crate::client::{EventAck, HealthStatus, OrchestratorApi};
use crate::models::Event;
use crate::{Error, Result};
use std::sync::Mutex;

pub struct FakeOrchestrator {
    context: Vec<String>,
    offline: bool,
    queries: Mutex<Vec<Option<String>>>,
    events: Mutex<Vec<Event>>,
}

impl FakeOrchestrator {
    pub fn with_context(context: Vec<String>) -> Self {
        Self {
            context,
            offline: false,
            queries: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::with_context(Vec::new())
        }
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().unwrap().last().cloned().flatten()
    }

    pub fn last_event(&self) -> Option<Event> {
        self.events.lock().unwrap().last().cloned()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            Err(Error::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl OrchestratorApi for FakeOrchestrator {
    fn health(&self) -> Result<HealthStatus> {
        self.check_online()?;
        Ok(HealthStatus {
            status: "TraceContext Orchestrator Online".to_string(),
            version: "test".to_string(),
        })
    }

    fn post_event(&self, event: &Event) -> Result<EventAck> {
        self.check_online()?;
        self.events.lock().unwrap().push(event.clone());
        Ok(EventAck {
            status: "received".to_string(),
            event_id: "evt-1".to_string(),
            kind: event.kind.to_string(),
            degraded: true,
        })
    }

    fn context(&self, query: Option<&str>) -> Result<Vec<String>> {
        self.check_online()?;
        self.queries
            .lock()
            .unwrap()
            .push(query.map(ToString::to_string));
        Ok(self.context.clone())
    }

    fn reset(&self) -> Result<usize> {
        self.check_online()?;
        Ok(self.context.len())
    }
}
