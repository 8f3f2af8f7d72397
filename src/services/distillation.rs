//! Distillation agent: code change to architecture decision record.

use super::record_agent_call;
use crate::llm::{LlmProvider, parse_json_response, prompts};
use crate::models::{AgentOutcome, DecisionRecord, DegradedReason};
use std::sync::Arc;
use std::time::Instant;

const FALLBACK_TITLE: &str = "Architecture Change Detected";
const FALLBACK_STATUS: &str = "Proposed";
const FALLBACK_CONSEQUENCES: &str = "Not analyzed: automatic distillation was unavailable.";
const NOT_PROVIDED: &str = "Not provided.";

/// Turns a commit message and diff into a [`DecisionRecord`].
#[derive(Clone, Default)]
pub struct DistillationAgent {
    llm: Option<Arc<dyn LlmProvider>>,
}

impl DistillationAgent {
    /// Creates an agent. `None` selects the placeholder path for every call.
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm }
    }

    /// Returns true if a provider is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Distills a code change. Never fails.
    #[tracing::instrument(name = "agent.distill", skip_all, fields(diff_bytes = diff.len()))]
    pub fn distill(&self, diff: &str, commit_message: &str) -> AgentOutcome<DecisionRecord> {
        let start = Instant::now();
        let outcome = match &self.llm {
            None => AgentOutcome::Degraded {
                record: unconfigured_record(commit_message),
                reason: DegradedReason::Unconfigured,
            },
            Some(llm) => match generate(llm.as_ref(), diff, commit_message) {
                Ok(record) => AgentOutcome::Generated(record),
                Err(e) => {
                    tracing::warn!(provider = llm.name(), error = %e, "Distillation failed, using placeholder");
                    let cause = e.to_string();
                    AgentOutcome::Degraded {
                        record: failure_record(commit_message, &cause),
                        reason: DegradedReason::ProviderFailed(cause),
                    }
                },
            },
        };
        record_agent_call("distill", outcome.label(), start);
        outcome
    }
}

fn generate(llm: &dyn LlmProvider, diff: &str, commit_message: &str) -> crate::Result<DecisionRecord> {
    let user = prompts::distill_user_prompt(diff, commit_message);
    let response = llm.complete_with_system(prompts::DISTILL_SYSTEM_PROMPT, &user)?;
    let record: DecisionRecord = parse_json_response("parse_decision_record", &response)?;
    Ok(fill_empty_fields(record))
}

fn fill_empty_fields(mut record: DecisionRecord) -> DecisionRecord {
    for (field, default) in [
        (&mut record.title, "Untitled decision"),
        (&mut record.status, FALLBACK_STATUS),
        (&mut record.context, NOT_PROVIDED),
        (&mut record.decision, NOT_PROVIDED),
        (&mut record.consequences, NOT_PROVIDED),
    ] {
        if field.trim().is_empty() {
            *field = default.to_string();
        }
    }
    record
}

fn subject_line(commit_message: &str) -> &str {
    commit_message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("untitled change")
}

fn unconfigured_record(commit_message: &str) -> DecisionRecord {
    DecisionRecord {
        title: format!("Code change: {}", subject_line(commit_message)),
        status: FALLBACK_STATUS.to_string(),
        context: format!(
            "No LLM provider is configured. Set ANTHROPIC_API_KEY or OPENAI_API_KEY to distill \
             changes automatically. Commit message: {commit_message}"
        ),
        decision: non_empty_or(commit_message, NOT_PROVIDED),
        consequences: FALLBACK_CONSEQUENCES.to_string(),
    }
}

fn failure_record(commit_message: &str, error: &str) -> DecisionRecord {
    DecisionRecord {
        title: FALLBACK_TITLE.to_string(),
        status: FALLBACK_STATUS.to_string(),
        context: format!("Automatic distillation failed: {error}"),
        decision: non_empty_or(commit_message, NOT_PROVIDED),
        consequences: FALLBACK_CONSEQUENCES.to_string(),
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
