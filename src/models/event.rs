//! Incoming events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of an externally observed event.
///
/// Wire names are `code-change` and `approach-abandoned`. The names emitted by
/// older hooks (`git_commit`, `revert_detected`) are accepted as aliases. Any
/// other string is kept verbatim so it can be logged and routed to the
/// map-update placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A commit or other code change.
    CodeChange,
    /// An approach was reverted or abandoned.
    ApproachAbandoned,
    /// Anything else.
    Other(String),
}

impl EventKind {
    /// Parses an event kind from its wire name.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "code-change" | "code_change" | "git_commit" => Self::CodeChange,
            "approach-abandoned" | "approach_abandoned" | "revert_detected" => {
                Self::ApproachAbandoned
            },
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the canonical wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CodeChange => "code-change",
            Self::ApproachAbandoned => "approach-abandoned",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// An externally observed occurrence, as posted to `POST /events`.
///
/// Events are immutable and never stored themselves; only the record distilled
/// from them is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Declared event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Free-form payload (commit message and diff, or approach and reason).
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    /// Free-form origin metadata (repository, actor, source tool).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            data: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a payload field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Adds a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns a payload field as text.
    ///
    /// Strings are returned as-is, other JSON values in their JSON rendering,
    /// and missing or null fields as an empty string.
    #[must_use]
    pub fn text_field(&self, key: &str) -> String {
        self.data.get(key).map(value_as_text).unwrap_or_default()
    }

    /// Renders the whole payload as `key: value` lines in key order.
    ///
    /// This is the activity log handed to the dead-end agent.
    #[must_use]
    pub fn render_payload(&self) -> String {
        self.data
            .iter()
            .map(|(key, value)| format!("{key}: {}", value_as_text(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
