//! MCP tools backed by the orchestrator API.
//!
//! Tool failures are reported as text content, never as JSON-RPC errors:
//! an offline orchestrator yields a hint to start it, any other failure an
//! `[TraceContext] Error: ...` line.

use crate::client::OrchestratorApi;
use crate::models::{Event, EventKind};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Text returned when the orchestrator cannot be reached.
pub const OFFLINE_MESSAGE: &str =
    "[TraceContext] Orchestrator is offline.\nStart it first with: tracecontext serve";

/// Text returned when the store is empty.
pub const NO_RECORDS_MESSAGE: &str = "No context records found.";

/// Separator between records in tool and resource output.
pub const RECORD_SEPARATOR: &str = "\n\n---\n\n";

/// Metadata `source` of events created from an MCP session.
pub const MCP_SOURCE: &str = "mcp-session";

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: &'static str,
    /// Tool description shown to the model.
    pub description: &'static str,
    /// JSON Schema of the arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// An error text result.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Concatenated text content.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content types returned by tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddDecisionArgs {
    title: String,
    decision: String,
    context: String,
    #[serde(default)]
    consequences: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddDeadEndArgs {
    approach: String,
    reason: String,
    #[serde(default)]
    alternative: String,
}

/// Lists every tool.
#[must_use]
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search_context",
            description: "Search TraceContext for architectural decisions and dead-end records. \
                Call this whenever the developer asks why a technology or pattern was chosen, \
                why an approach was abandoned, or how a component is structured.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keywords or a question, e.g. \"why Stripe\" or \"payment pattern\""
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "add_decision",
            description: "Record an architecture decision made in this session so future \
                sessions and teammates know about it.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Short title, e.g. \"Use Stripe instead of Braintree\""},
                    "decision": {"type": "string", "description": "What was decided and the key reasoning"},
                    "context": {"type": "string", "description": "The problem that drove the decision"},
                    "consequences": {"type": "string", "description": "Trade-offs (optional)"}
                },
                "required": ["title", "decision", "context"]
            }),
        },
        ToolDefinition {
            name: "add_dead_end",
            description: "Record a failed or abandoned approach immediately so it is never \
                repeated.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "approach": {"type": "string", "description": "What was tried"},
                    "reason": {"type": "string", "description": "Why it failed or was abandoned"},
                    "alternative": {"type": "string", "description": "What was done instead (optional)"}
                },
                "required": ["approach", "reason"]
            }),
        },
    ]
}

/// Executes a tool against the orchestrator.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unknown tool or malformed
/// arguments. Orchestrator failures are folded into the result text.
pub fn execute(api: &dyn OrchestratorApi, name: &str, arguments: Value) -> Result<ToolResult> {
    match name {
        "search_context" => {
            let args: SearchArgs = parse_args(name, arguments)?;
            Ok(search_context(api, &args.query))
        },
        "add_decision" => {
            let args: AddDecisionArgs = parse_args(name, arguments)?;
            Ok(add_decision(api, &args))
        },
        "add_dead_end" => {
            let args: AddDeadEndArgs = parse_args(name, arguments)?;
            Ok(add_dead_end(api, &args))
        },
        other => Err(Error::InvalidInput(format!("Unknown tool: {other}"))),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::InvalidInput(format!("invalid arguments for {tool}: {e}")))
}

fn search_context(api: &dyn OrchestratorApi, query: &str) -> ToolResult {
    match api.context(Some(query)) {
        Ok(records) if records.is_empty() => {
            ToolResult::text(format!("No context found for '{query}'."))
        },
        Ok(records) => ToolResult::text(format!(
            "Found {} record(s) for '{query}':\n\n{}",
            records.len(),
            records.join(RECORD_SEPARATOR)
        )),
        Err(e) => failure_result(&e),
    }
}

fn add_decision(api: &dyn OrchestratorApi, args: &AddDecisionArgs) -> ToolResult {
    let mut diff = format!("Context: {}\nDecision: {}", args.context, args.decision);
    if !args.consequences.is_empty() {
        diff.push_str("\nConsequences: ");
        diff.push_str(&args.consequences);
    }

    let event = Event::new(EventKind::CodeChange)
        .with_data("message", args.title.as_str())
        .with_data("diff", diff)
        .with_metadata("source", MCP_SOURCE);

    match api.post_event(&event) {
        Ok(ack) => {
            tracing::info!(event_id = %ack.event_id, "Decision recorded from MCP session");
            ToolResult::text(format!(
                "Decision recorded: '{}'. Available in all future sessions and to all teammates.",
                args.title
            ))
        },
        Err(e) => failure_result(&e),
    }
}

fn add_dead_end(api: &dyn OrchestratorApi, args: &AddDeadEndArgs) -> ToolResult {
    let mut event = Event::new(EventKind::ApproachAbandoned)
        .with_data("approach", args.approach.as_str())
        .with_data("reason", args.reason.as_str())
        .with_metadata("source", MCP_SOURCE);
    if !args.alternative.is_empty() {
        event = event.with_data("alternative", args.alternative.as_str());
    }

    match api.post_event(&event) {
        Ok(ack) => {
            tracing::info!(event_id = %ack.event_id, "Dead-end recorded from MCP session");
            ToolResult::text(format!(
                "Dead-end recorded: '{}'.\nThis approach will never be suggested again in future sessions.",
                args.approach
            ))
        },
        Err(e) => failure_result(&e),
    }
}

/// Maps an orchestrator failure to tool output.
pub(crate) fn failure_result(err: &Error) -> ToolResult {
    match err {
        Error::Unavailable(_) => ToolResult::text(OFFLINE_MESSAGE),
        other => ToolResult::error(format!("[TraceContext] Error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::testing::FakeOrchestrator;

    #[test]
    fn test_list_tools_names() {
        let names: Vec<_> = list_tools().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["search_context", "add_decision", "add_dead_end"]);
    }

    #[test]
    fn test_search_formats_records() {
        let api = FakeOrchestrator::with_context(vec![
            "[ADR] Title: Use Stripe".to_string(),
            "[DEAD_END] Approach: Braintree".to_string(),
        ]);
        let result = execute(&api, "search_context", json!({"query": "payment"})).unwrap();
        assert!(!result.is_error);
        assert_eq!(
            result.joined_text(),
            "Found 2 record(s) for 'payment':\n\n[ADR] Title: Use Stripe\n\n---\n\n[DEAD_END] Approach: Braintree"
        );
        assert_eq!(api.last_query(), Some("payment".to_string()));
    }

    #[test]
    fn test_search_empty() {
        let api = FakeOrchestrator::with_context(vec![]);
        let result = execute(&api, "search_context", json!({"query": "kafka"})).unwrap();
        assert_eq!(result.joined_text(), "No context found for 'kafka'.");
    }

    #[test]
    fn test_offline_is_text_not_error() {
        let api = FakeOrchestrator::offline();
        let result = execute(&api, "search_context", json!({"query": "x"})).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), OFFLINE_MESSAGE);
    }

    #[test]
    fn test_add_decision_builds_event() {
        let api = FakeOrchestrator::with_context(vec![]);
        let result = execute(
            &api,
            "add_decision",
            json!({
                "title": "Use Stripe",
                "decision": "Stripe for all payments",
                "context": "Braintree lacks coverage",
                "consequences": "Vendor lock-in"
            }),
        )
        .unwrap();
        assert!(result.joined_text().starts_with("Decision recorded: 'Use Stripe'."));

        let event = api.last_event().unwrap();
        assert_eq!(event.kind, EventKind::CodeChange);
        assert_eq!(event.text_field("message"), "Use Stripe");
        assert_eq!(
            event.text_field("diff"),
            "Context: Braintree lacks coverage\nDecision: Stripe for all payments\nConsequences: Vendor lock-in"
        );
        assert_eq!(event.metadata.get("source"), Some(&Value::from(MCP_SOURCE)));
    }

    #[test]
    fn test_add_decision_without_consequences() {
        let api = FakeOrchestrator::with_context(vec![]);
        execute(
            &api,
            "add_decision",
            json!({"title": "t", "decision": "d", "context": "c"}),
        )
        .unwrap();
        assert_eq!(api.last_event().unwrap().text_field("diff"), "Context: c\nDecision: d");
    }

    #[test]
    fn test_add_dead_end_builds_event() {
        let api = FakeOrchestrator::with_context(vec![]);
        let result = execute(
            &api,
            "add_dead_end",
            json!({"approach": "Braintree", "reason": "46-country limit"}),
        )
        .unwrap();
        assert!(result.joined_text().starts_with("Dead-end recorded: 'Braintree'."));

        let event = api.last_event().unwrap();
        assert_eq!(event.kind, EventKind::ApproachAbandoned);
        assert_eq!(event.text_field("reason"), "46-country limit");
        assert!(!event.data.contains_key("alternative"));
    }

    #[test]
    fn test_missing_argument_is_invalid_input() {
        let api = FakeOrchestrator::with_context(vec![]);
        let err = execute(&api, "add_dead_end", json!({"approach": "x"})).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_tool() {
        let api = FakeOrchestrator::with_context(vec![]);
        let err = execute(&api, "capture", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: Unknown tool: capture");
    }

    #[test]
    fn test_other_failure_is_error_result() {
        let err = Error::OperationFailed {
            operation: "orchestrator_context".to_string(),
            cause: "HTTP 500".to_string(),
        };
        let result = failure_result(&err);
        assert!(result.is_error);
        assert!(result.joined_text().starts_with("[TraceContext] Error: "));
    }
}
