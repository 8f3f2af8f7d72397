//! Agent outcomes.

use std::fmt;

/// Why an agent fell back to a placeholder record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// No LLM credential is configured.
    Unconfigured,
    /// The provider call failed; carries the error text.
    ProviderFailed(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => f.write_str("no LLM provider configured"),
            Self::ProviderFailed(cause) => write!(f, "LLM provider failed: {cause}"),
        }
    }
}

/// Result of an agent call.
///
/// Agents never fail: a provider error becomes a `Degraded` outcome that still
/// carries a usable placeholder record.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome<T> {
    /// The record came from the LLM provider.
    Generated(T),
    /// The record is a deterministic placeholder.
    Degraded {
        /// The placeholder record.
        record: T,
        /// Why the placeholder was produced.
        reason: DegradedReason,
    },
}

impl<T> AgentOutcome<T> {
    /// Returns the record regardless of how it was produced.
    pub const fn record(&self) -> &T {
        match self {
            Self::Generated(record) | Self::Degraded { record, .. } => record,
        }
    }

    /// Consumes the outcome and returns the record.
    pub fn into_record(self) -> T {
        match self {
            Self::Generated(record) | Self::Degraded { record, .. } => record,
        }
    }

    /// Returns true if the record is a placeholder.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns the degradation reason, if any.
    pub const fn reason(&self) -> Option<&DegradedReason> {
        match self {
            Self::Generated(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Metric label for this outcome.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Generated(_) => "generated",
            Self::Degraded {
                reason: DegradedReason::Unconfigured,
                ..
            } => "unconfigured",
            Self::Degraded {
                reason: DegradedReason::ProviderFailed(_),
                ..
            } => "provider_failed",
        }
    }

    /// Maps the record, keeping the outcome variant.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AgentOutcome<U> {
        match self {
            Self::Generated(record) => AgentOutcome::Generated(f(record)),
            Self::Degraded { record, reason } => AgentOutcome::Degraded {
                record: f(record),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_accessors() {
        let outcome = AgentOutcome::Generated(7);
        assert_eq!(*outcome.record(), 7);
        assert!(!outcome.is_degraded());
        assert!(outcome.reason().is_none());
        assert_eq!(outcome.label(), "generated");
    }

    #[test]
    fn test_degraded_accessors() {
        let outcome = AgentOutcome::Degraded {
            record: "placeholder",
            reason: DegradedReason::ProviderFailed("timeout".to_string()),
        };
        assert!(outcome.is_degraded());
        assert_eq!(outcome.label(), "provider_failed");
        assert_eq!(
            outcome.reason().map(ToString::to_string).as_deref(),
            Some("LLM provider failed: timeout")
        );
        assert_eq!(outcome.into_record(), "placeholder");
    }

    #[test]
    fn test_map_keeps_variant() {
        let outcome = AgentOutcome::Degraded {
            record: 2,
            reason: DegradedReason::Unconfigured,
        }
        .map(|n| n * 10);
        assert_eq!(
            outcome,
            AgentOutcome::Degraded {
                record: 20,
                reason: DegradedReason::Unconfigured
            }
        );
    }
}
