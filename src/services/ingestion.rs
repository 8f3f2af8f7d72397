//! Ingestion service.
//!
//! Orchestrates the router, the ranking agent and the context store. Agent
//! and ranking degradation is absorbed here; only store errors surface.

use super::{EventRouter, RankingAgent};
use crate::Result;
use crate::models::{
    AgentOutcome, ContextChunk, ContextRecord, DegradedReason, Event, RecordId, RelevanceScore,
};
use crate::storage::ContextStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Acknowledgement of an ingested event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    /// Fresh identifier, also used as the stored record id.
    pub event_id: String,
    /// Canonical event kind.
    pub kind: String,
    /// True if the stored record is a placeholder.
    pub degraded: bool,
}

/// Records returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Records in response order.
    pub records: Vec<ContextRecord>,
    /// True if the order came from the ranking agent.
    pub ranked: bool,
}

impl QueryResult {
    /// Formatted text of every record, in response order.
    #[must_use]
    pub fn formatted(&self) -> Vec<String> {
        self.records.iter().map(ContextRecord::formatted).collect()
    }
}

/// Event ingestion and context query service.
#[derive(Clone)]
pub struct IngestionService {
    router: EventRouter,
    ranker: RankingAgent,
    store: Arc<dyn ContextStore>,
    rerank: bool,
}

impl IngestionService {
    /// Creates a service with re-ranking enabled.
    #[must_use]
    pub fn new(router: EventRouter, ranker: RankingAgent, store: Arc<dyn ContextStore>) -> Self {
        Self {
            router,
            ranker,
            store,
            rerank: true,
        }
    }

    /// Enables or disables re-ranking of keyword hits.
    #[must_use]
    pub const fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    /// Name of the backing store.
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Routes an event, runs its agent, and appends the resulting record.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store append fails.
    #[tracing::instrument(name = "ingest", skip_all, fields(kind = %event.kind))]
    pub fn ingest(&self, event: Event) -> Result<IngestReceipt> {
        let event_id = uuid::Uuid::new_v4().to_string();
        let distilled = self.router.dispatch(&event);
        let degraded = distilled.is_degraded();
        let record = distilled.into_context_record(RecordId::new(event_id.clone()), &event);
        let record_kind = record.kind;

        self.store.append(record)?;

        metrics::counter!(
            "tracecontext_events_total",
            "kind" => record_kind.tag(),
            "degraded" => if degraded { "true" } else { "false" }
        )
        .increment(1);
        tracing::info!(event_id = %event_id, record_kind = %record_kind, degraded, "Event ingested");

        Ok(IngestReceipt {
            event_id,
            kind: event.kind.to_string(),
            degraded,
        })
    }

    /// Returns the whole store for an empty query, otherwise keyword hits
    /// (or the whole store on zero hits) optionally re-ranked.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store read fails.
    #[tracing::instrument(name = "query", skip_all, fields(has_query = query.is_some()))]
    pub fn query(&self, query: Option<&str>) -> Result<QueryResult> {
        let Some(text) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return Ok(QueryResult {
                records: self.store.list_all()?,
                ranked: false,
            });
        };

        let outcome = self.store.search(text)?;
        if outcome.fallback {
            tracing::debug!(query = text, "No keyword match, returning whole store");
        }

        let (records, ranked) = if self.rerank && outcome.records.len() >= 2 {
            self.rerank_records(text, outcome.records)
        } else {
            (outcome.records, false)
        };

        metrics::counter!(
            "tracecontext_search_total",
            "ranked" => if ranked { "true" } else { "false" },
            "fallback" => if outcome.fallback { "true" } else { "false" }
        )
        .increment(1);

        Ok(QueryResult { records, ranked })
    }

    /// Clears the store, returning the number of removed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reset fails.
    pub fn reset(&self) -> Result<usize> {
        let cleared = self.store.reset()?;
        tracing::info!(cleared, "Context store reset");
        Ok(cleared)
    }

    /// Every record in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn list(&self) -> Result<Vec<ContextRecord>> {
        self.store.list_all()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    fn rerank_records(
        &self,
        task: &str,
        records: Vec<ContextRecord>,
    ) -> (Vec<ContextRecord>, bool) {
        let chunks: Vec<ContextChunk> = records
            .iter()
            .enumerate()
            .map(|(i, record)| ContextChunk::new((i + 1).to_string(), record.formatted()))
            .collect();

        let scores = match self.ranker.rank(task, &chunks) {
            AgentOutcome::Generated(scores) => scores,
            AgentOutcome::Degraded {
                reason: DegradedReason::Unconfigured,
                ..
            } => return (records, false),
            AgentOutcome::Degraded { reason, .. } => {
                tracing::warn!(%reason, "Ranking degraded, keeping store order");
                return (records, false);
            },
        };

        match order_by_scores(&chunks, &scores) {
            Some(order) => {
                let mut slots: Vec<Option<ContextRecord>> = records.into_iter().map(Some).collect();
                let ranked = order
                    .into_iter()
                    .filter_map(|index| slots.get_mut(index).and_then(Option::take))
                    .collect();
                (ranked, true)
            },
            None => {
                tracing::warn!(
                    expected = chunks.len(),
                    received = scores.len(),
                    "Ranking output does not match candidates, keeping store order"
                );
                (records, false)
            },
        }
    }
}

/// Maps scores back to candidate positions, sorted by descending score.
///
/// Returns `None` unless every chunk received exactly one score. Ties keep
/// store order.
fn order_by_scores(chunks: &[ContextChunk], scores: &[RelevanceScore]) -> Option<Vec<usize>> {
    if scores.len() != chunks.len() {
        return None;
    }
    let positions: HashMap<&str, usize> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| (chunk.id.as_str(), i))
        .collect();

    let mut by_position: Vec<Option<f32>> = vec![None; chunks.len()];
    for score in scores {
        let index = *positions.get(score.id.as_str())?;
        let slot = by_position.get_mut(index)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(score.clamped());
    }

    let mut order: Vec<(usize, f32)> = by_position
        .into_iter()
        .enumerate()
        .map(|(i, score)| score.map(|s| (i, s)))
        .collect::<Option<_>>()?;
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some(order.into_iter().map(|(i, _)| i).collect())
}
