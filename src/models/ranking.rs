//! Ranking inputs and outputs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A labeled chunk of text handed to the ranking agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Chunk label, echoed back in the score.
    pub id: String,
    /// Chunk text.
    pub content: String,
}

impl ContextChunk {
    /// Creates a chunk.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Relevance of one chunk to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    /// Chunk label. Models sometimes echo numeric labels as numbers.
    #[serde(deserialize_with = "label_text")]
    pub id: String,
    /// Relevance in `[0.0, 1.0]`.
    #[serde(alias = "relevance_score")]
    pub score: f32,
    /// Brief reason for the score.
    #[serde(default)]
    pub reasoning: String,
}

impl RelevanceScore {
    /// Returns the score clamped to `[0.0, 1.0]`, with NaN mapped to `0.0`.
    #[must_use]
    pub fn clamped(&self) -> f32 {
        if self.score.is_nan() {
            0.0
        } else {
            self.score.clamp(0.0, 1.0)
        }
    }

    /// Returns true if the raw score lies in `[0.0, 1.0]`.
    #[must_use]
    pub fn in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.score)
    }
}

fn label_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid chunk id: {other}"))),
    }
}

/// Structured ranking response requested from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingResult {
    /// One score per chunk.
    pub scores: Vec<RelevanceScore>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.5, 0.5; "in range")]
    #[test_case(1.7, 1.0; "above range")]
    #[test_case(-0.2, 0.0; "below range")]
    #[test_case(f32::NAN, 0.0; "nan")]
    fn test_clamped(raw: f32, expected: f32) {
        let score = RelevanceScore {
            id: "1".to_string(),
            score: raw,
            reasoning: String::new(),
        };
        assert!((score.clamped() - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_deserialize_relevance_score_alias() {
        let json = r#"{"scores": [{"id": "1", "relevance_score": 0.8, "reasoning": "close"}]}"#;
        let result: RankingResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.scores.len(), 1);
        assert!((result.scores[0].score - 0.8).abs() < f32::EPSILON);
        assert!(result.scores[0].in_range());
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let json = r#"{"scores": [{"id": 2, "score": 0.1}]}"#;
        let result: RankingResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.scores[0].id, "2");
        assert!(serde_json::from_str::<RankingResult>(r#"{"scores": [{"id": [], "score": 0.1}]}"#).is_err());
    }
}
