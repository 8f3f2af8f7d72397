//! Dead-end agent: activity log to abandoned-approach record.

use super::record_agent_call;
use crate::llm::{LlmProvider, parse_json_response, prompts};
use crate::models::{AgentOutcome, DeadEndRecord, DegradedReason};
use std::sync::Arc;
use std::time::Instant;

const UNKNOWN_APPROACH: &str = "Unspecified approach";
const UNKNOWN_ALTERNATIVE: &str = "Not recorded.";

/// Turns a free-text activity log into a [`DeadEndRecord`].
#[derive(Clone, Default)]
pub struct DeadEndAgent {
    llm: Option<Arc<dyn LlmProvider>>,
}

impl DeadEndAgent {
    /// Creates an agent. `None` selects the placeholder path for every call.
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm }
    }

    /// Tracks an abandoned approach. Never fails.
    #[tracing::instrument(name = "agent.dead_end", skip_all, fields(activity_bytes = activity.len()))]
    pub fn track(&self, activity: &str) -> AgentOutcome<DeadEndRecord> {
        let start = Instant::now();
        let outcome = match &self.llm {
            None => AgentOutcome::Degraded {
                record: DeadEndRecord {
                    approach: non_empty_or(activity, UNKNOWN_APPROACH),
                    failure_reason: "No LLM provider is configured. Set ANTHROPIC_API_KEY or \
                                     OPENAI_API_KEY to analyze abandoned approaches."
                        .to_string(),
                    alternative: UNKNOWN_ALTERNATIVE.to_string(),
                },
                reason: DegradedReason::Unconfigured,
            },
            Some(llm) => match generate(llm.as_ref(), activity) {
                Ok(record) => AgentOutcome::Generated(record),
                Err(e) => {
                    tracing::warn!(provider = llm.name(), error = %e, "Dead-end analysis failed, using placeholder");
                    let cause = e.to_string();
                    AgentOutcome::Degraded {
                        record: DeadEndRecord {
                            approach: non_empty_or(activity, UNKNOWN_APPROACH),
                            failure_reason: format!("Automatic analysis failed: {cause}"),
                            alternative: UNKNOWN_ALTERNATIVE.to_string(),
                        },
                        reason: DegradedReason::ProviderFailed(cause),
                    }
                },
            },
        };
        record_agent_call("dead_end", outcome.label(), start);
        outcome
    }
}

fn generate(llm: &dyn LlmProvider, activity: &str) -> crate::Result<DeadEndRecord> {
    let user = prompts::dead_end_user_prompt(activity);
    let response = llm.complete_with_system(prompts::DEAD_END_SYSTEM_PROMPT, &user)?;
    let mut record: DeadEndRecord = parse_json_response("parse_dead_end_record", &response)?;
    if record.approach.trim().is_empty() {
        record.approach = non_empty_or(activity, UNKNOWN_APPROACH);
    }
    if record.failure_reason.trim().is_empty() {
        record.failure_reason = "Not provided.".to_string();
    }
    if record.alternative.trim().is_empty() {
        record.alternative = UNKNOWN_ALTERNATIVE.to_string();
    }
    Ok(record)
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.trim().to_string()
    }
}
