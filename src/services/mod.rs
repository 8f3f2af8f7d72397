//! Business logic services.
//!
//! Agents turn events into records; the ingestion service orchestrates the
//! router, the ranking agent and the context store.

mod backend_factory;
mod dead_end;
mod distillation;
mod ingestion;
mod ranking;
mod router;
#[cfg(test)]
pub(crate) mod testing;

pub use backend_factory::create_store;
pub use dead_end::DeadEndAgent;
pub use distillation::DistillationAgent;
pub use ingestion::{IngestReceipt, IngestionService, QueryResult};
pub use ranking::{FALLBACK_SCORE, RankingAgent};
pub use router::{Distilled, EventRouter, MAP_UPDATE_CONTENT, Route, route};

use std::time::Instant;

/// Records the agent call counter and duration histogram.
fn record_agent_call(agent: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "tracecontext_agent_calls_total",
        "agent" => agent,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("tracecontext_agent_duration_ms", "agent" => agent)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
