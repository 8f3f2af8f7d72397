//! Data models for tracecontext.
//!
//! This module contains the core data structures: incoming events, the
//! records the agents distill from them, ranking scores, and the outcome type
//! that tells a generated record apart from a fallback one.

mod event;
mod outcome;
mod ranking;
mod record;

pub use event::{Event, EventKind};
pub use outcome::{AgentOutcome, DegradedReason};
pub use ranking::{ContextChunk, RankingResult, RelevanceScore};
pub use record::{ContextRecord, DeadEndRecord, DecisionRecord, RecordId, RecordKind};
