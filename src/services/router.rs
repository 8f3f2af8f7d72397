//! Event routing.
//!
//! Routing is a pure function of the event kind. Dispatch runs the selected
//! agent and returns a tagged [`Distilled`] value the ingestion service turns
//! into a stored record.

use super::{DeadEndAgent, DistillationAgent};
use crate::llm::LlmProvider;
use crate::models::{
    AgentOutcome, ContextRecord, DeadEndRecord, DecisionRecord, Event, EventKind, RecordId,
    RecordKind,
};
use std::sync::Arc;

/// Constant content of a map-update record.
pub const MAP_UPDATE_CONTENT: &str = "Codebase map updated.";

/// Processing branch selected for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Distill into an ADR.
    Distill,
    /// Track a dead end.
    DeadEnd,
    /// Map-update placeholder.
    MapUpdate,
}

impl Route {
    /// Route name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distill => "distill",
            Self::DeadEnd => "dead_end",
            Self::MapUpdate => "map_update",
        }
    }
}

/// Selects the processing branch for an event kind. Total; never fails.
#[must_use]
pub const fn route(kind: &EventKind) -> Route {
    match kind {
        EventKind::CodeChange => Route::Distill,
        EventKind::ApproachAbandoned => Route::DeadEnd,
        EventKind::Other(_) => Route::MapUpdate,
    }
}

/// Output of a dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub enum Distilled {
    /// Decision record from the distillation agent.
    Adr(AgentOutcome<DecisionRecord>),
    /// Abandoned-approach record from the dead-end agent.
    DeadEnd(AgentOutcome<DeadEndRecord>),
    /// Map-update placeholder.
    MapUpdate,
}

impl Distilled {
    /// Record kind tag.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Adr(_) => RecordKind::Adr,
            Self::DeadEnd(_) => RecordKind::DeadEnd,
            Self::MapUpdate => RecordKind::MapUpdate,
        }
    }

    /// True if an agent produced a placeholder.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        match self {
            Self::Adr(outcome) => outcome.is_degraded(),
            Self::DeadEnd(outcome) => outcome.is_degraded(),
            Self::MapUpdate => false,
        }
    }

    /// Rendered record body.
    #[must_use]
    pub fn content(&self) -> String {
        match self {
            Self::Adr(outcome) => outcome.record().render(),
            Self::DeadEnd(outcome) => outcome.record().render(),
            Self::MapUpdate => MAP_UPDATE_CONTENT.to_string(),
        }
    }

    /// Builds the stored record.
    #[must_use]
    pub fn into_context_record(self, id: RecordId, event: &Event) -> ContextRecord {
        ContextRecord::new(id, self.kind(), self.content())
            .with_degraded(self.is_degraded())
            .with_metadata(event.metadata.clone())
    }
}

/// Dispatches events to the agent their kind selects.
#[derive(Clone, Default)]
pub struct EventRouter {
    distiller: DistillationAgent,
    dead_end: DeadEndAgent,
}

impl EventRouter {
    /// Creates a router whose agents share one provider. `None` makes every
    /// agent use its placeholder path.
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            distiller: DistillationAgent::new(llm.clone()),
            dead_end: DeadEndAgent::new(llm),
        }
    }

    /// Creates a router with no provider.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Creates a router from explicit agents.
    #[must_use]
    pub const fn with_agents(distiller: DistillationAgent, dead_end: DeadEndAgent) -> Self {
        Self {
            distiller,
            dead_end,
        }
    }

    /// Runs the agent selected by [`route`].
    #[tracing::instrument(name = "router.dispatch", skip_all, fields(kind = %event.kind))]
    pub fn dispatch(&self, event: &Event) -> Distilled {
        let selected = route(&event.kind);
        tracing::debug!(route = selected.as_str(), "Routing event");
        match selected {
            Route::Distill => Distilled::Adr(
                self.distiller
                    .distill(&event.text_field("diff"), &event.text_field("message")),
            ),
            Route::DeadEnd => Distilled::DeadEnd(self.dead_end.track(&event.render_payload())),
            Route::MapUpdate => Distilled::MapUpdate,
        }
    }
}
