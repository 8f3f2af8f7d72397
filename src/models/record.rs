//! Distilled records and the stored context record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// An architecture decision record distilled from a code change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Title of the decision.
    pub title: String,
    /// Status (proposed, accepted, superseded; free text in practice).
    pub status: String,
    /// Problem description and context.
    pub context: String,
    /// The chosen solution.
    pub decision: String,
    /// Trade-offs of the decision.
    pub consequences: String,
}

impl DecisionRecord {
    /// Renders the record as stored text (without the kind tag).
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Title: {}\nStatus: {}\nContext: {}\nDecision: {}\nConsequences: {}",
            self.title, self.status, self.context, self.decision, self.consequences
        )
    }
}

/// A documented abandoned approach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadEndRecord {
    /// The approach that was attempted.
    pub approach: String,
    /// Why it was abandoned or reverted.
    pub failure_reason: String,
    /// What was done instead.
    #[serde(alias = "alternatives")]
    pub alternative: String,
}

impl DeadEndRecord {
    /// Renders the record as stored text (without the kind tag).
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Approach: {}\nReason: {}\nAlternative: {}",
            self.approach, self.failure_reason, self.alternative
        )
    }
}

/// Kind tag of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    /// Architecture decision record.
    Adr,
    /// Abandoned approach.
    DeadEnd,
    /// Codebase map placeholder.
    MapUpdate,
}

impl RecordKind {
    /// Returns the tag used in formatted text.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Adr => "ADR",
            Self::DeadEnd => "DEAD_END",
            Self::MapUpdate => "MAP_UPDATE",
        }
    }

    /// Parses a tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADR" => Some(Self::Adr),
            "DEAD_END" => Some(Self::DeadEnd),
            "MAP_UPDATE" => Some(Self::MapUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Unique identifier for a stored record.
///
/// The ingestion service reuses the event id, so a record can be traced back
/// to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random (v4) record ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored, searchable unit of context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Unique identifier.
    pub id: RecordId,
    /// Kind tag.
    pub kind: RecordKind,
    /// Rendered record body.
    pub content: String,
    /// Whether the body is a fallback placeholder.
    #[serde(default)]
    pub degraded: bool,
    /// Origin metadata copied from the event.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl ContextRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(id: RecordId, kind: RecordKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            degraded: false,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Marks the record as a placeholder.
    #[must_use]
    pub const fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    /// Attaches origin metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Human-readable text, `[TAG] content`. This is what search matches on
    /// and what `GET /context` returns.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.kind.tag(), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_render() {
        let adr = DecisionRecord {
            title: "Use Redis for caching".to_string(),
            status: "Accepted".to_string(),
            context: "Low latency".to_string(),
            decision: "Adopt Redis".to_string(),
            consequences: "Extra infra".to_string(),
        };
        let text = adr.render();
        assert!(text.starts_with("Title: Use Redis for caching\n"));
        assert!(text.contains("Status: Accepted"));
        assert!(text.ends_with("Consequences: Extra infra"));
    }

    #[test]
    fn test_dead_end_accepts_plural_alias() {
        let json = r#"{"approach": "a", "failure_reason": "b", "alternatives": "c"}"#;
        let record: DeadEndRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.alternative, "c");
    }

    #[test]
    fn test_formatted_prefixes_tag() {
        let record = ContextRecord::new(
            RecordId::new("1"),
            RecordKind::MapUpdate,
            "Codebase map updated.",
        );
        assert_eq!(record.formatted(), "[MAP_UPDATE] Codebase map updated.");
    }

    #[test]
    fn test_kind_tag_roundtrip() {
        for kind in [RecordKind::Adr, RecordKind::DeadEnd, RecordKind::MapUpdate] {
            assert_eq!(RecordKind::parse(kind.tag()), Some(kind));
        }
        assert_eq!(RecordKind::parse("adr"), None);
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        assert_eq!(
            serde_json::to_value(RecordKind::DeadEnd).unwrap(),
            serde_json::json!("DEAD_END")
        );
    }
}
