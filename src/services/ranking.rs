//! Ranking agent: relevance score per context chunk.

use super::record_agent_call;
use crate::llm::{LlmProvider, parse_json_response, prompts};
use crate::models::{AgentOutcome, ContextChunk, DegradedReason, RankingResult, RelevanceScore};
use std::sync::Arc;
use std::time::Instant;

/// Score assigned to every chunk when no real scoring is possible.
pub const FALLBACK_SCORE: f32 = 0.9;

const UNCONFIGURED_REASONING: &str = "No LLM provider configured; all chunks treated as relevant.";

/// Scores context chunks against a task description.
#[derive(Clone, Default)]
pub struct RankingAgent {
    llm: Option<Arc<dyn LlmProvider>>,
}

impl RankingAgent {
    /// Creates an agent. `None` selects the uniform fallback for every call.
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm }
    }

    /// Returns true if a provider is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Ranks chunks. Never fails.
    ///
    /// Both fallback paths return exactly one score per chunk. The generated
    /// path returns whatever the provider produced; callers validate it.
    #[tracing::instrument(name = "agent.rank", skip_all, fields(chunks = chunks.len()))]
    pub fn rank(&self, task: &str, chunks: &[ContextChunk]) -> AgentOutcome<Vec<RelevanceScore>> {
        let start = Instant::now();
        let Some(llm) = &self.llm else {
            let outcome = AgentOutcome::Degraded {
                record: uniform(chunks, UNCONFIGURED_REASONING),
                reason: DegradedReason::Unconfigured,
            };
            record_agent_call("rank", outcome.label(), start);
            return outcome;
        };
        if chunks.is_empty() {
            return AgentOutcome::Generated(Vec::new());
        }

        let outcome = match generate(llm.as_ref(), task, chunks) {
            Ok(scores) => AgentOutcome::Generated(scores),
            Err(e) => {
                tracing::warn!(provider = llm.name(), error = %e, "Ranking failed, using uniform scores");
                let cause = e.to_string();
                AgentOutcome::Degraded {
                    record: uniform(chunks, &format!("Ranking unavailable: {cause}")),
                    reason: DegradedReason::ProviderFailed(cause),
                }
            },
        };
        record_agent_call("rank", outcome.label(), start);
        outcome
    }
}

fn generate(
    llm: &dyn LlmProvider,
    task: &str,
    chunks: &[ContextChunk],
) -> crate::Result<Vec<RelevanceScore>> {
    let user = prompts::rank_user_prompt(task, chunks);
    let response = llm.complete_with_system(prompts::RANK_SYSTEM_PROMPT, &user)?;
    let result: RankingResult = parse_json_response("parse_ranking_result", &response)?;
    Ok(result
        .scores
        .into_iter()
        .map(|mut score| {
            if !score.in_range() {
                tracing::debug!(id = %score.id, raw = score.score, "Clamping out-of-range score");
                score.score = score.clamped();
            }
            score
        })
        .collect())
}

fn uniform(chunks: &[ContextChunk], reasoning: &str) -> Vec<RelevanceScore> {
    chunks
        .iter()
        .map(|chunk| RelevanceScore {
            id: chunk.id.clone(),
            score: FALLBACK_SCORE,
            reasoning: reasoning.to_string(),
        })
        .collect()
}
