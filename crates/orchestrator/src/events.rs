//! Engine events, the edges of the debate state machine.
//!
//! `DebateEvent` is a tagged union: each variant carries its own typed
//! payload. The transition graph matches on the payload-free
//! `EventKind` discriminant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload-free event discriminant, used by transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Complete,
    Failed,
    QuestionsPending,
    AllClear,
    AnswersSubmitted,
    WaitingForInput,
    BeginRound,
    ContextsReady,
    ProposalsComplete,
    CritiquesComplete,
    RefinementsComplete,
    Continue,
    ConsensusReached,
    MaxRoundsReached,
    /// Reserved; no default rules route it.
    Retry,
    /// Reserved; no default rules route it.
    Fallback,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::QuestionsPending => "questions_pending",
            Self::AllClear => "all_clear",
            Self::AnswersSubmitted => "answers_submitted",
            Self::WaitingForInput => "waiting_for_input",
            Self::BeginRound => "begin_round",
            Self::ContextsReady => "contexts_ready",
            Self::ProposalsComplete => "proposals_complete",
            Self::CritiquesComplete => "critiques_complete",
            Self::RefinementsComplete => "refinements_complete",
            Self::Continue => "continue",
            Self::ConsensusReached => "consensus_reached",
            Self::MaxRoundsReached => "max_rounds_reached",
            Self::Retry => "retry",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An engine event with its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebateEvent {
    Start,
    Complete,
    Failed { reason: String },
    QuestionsPending { pending: usize },
    AllClear,
    AnswersSubmitted,
    WaitingForInput { pending: usize },
    BeginRound { round: u32 },
    ContextsReady,
    ProposalsComplete,
    CritiquesComplete { failed: usize },
    RefinementsComplete,
    Continue,
    ConsensusReached { confidence: f32 },
    MaxRoundsReached,
    Retry,
    Fallback,
}

impl DebateEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start => EventKind::Start,
            Self::Complete => EventKind::Complete,
            Self::Failed { .. } => EventKind::Failed,
            Self::QuestionsPending { .. } => EventKind::QuestionsPending,
            Self::AllClear => EventKind::AllClear,
            Self::AnswersSubmitted => EventKind::AnswersSubmitted,
            Self::WaitingForInput { .. } => EventKind::WaitingForInput,
            Self::BeginRound { .. } => EventKind::BeginRound,
            Self::ContextsReady => EventKind::ContextsReady,
            Self::ProposalsComplete => EventKind::ProposalsComplete,
            Self::CritiquesComplete { .. } => EventKind::CritiquesComplete,
            Self::RefinementsComplete => EventKind::RefinementsComplete,
            Self::Continue => EventKind::Continue,
            Self::ConsensusReached { .. } => EventKind::ConsensusReached,
            Self::MaxRoundsReached => EventKind::MaxRoundsReached,
            Self::Retry => EventKind::Retry,
            Self::Fallback => EventKind::Fallback,
        }
    }
}

/// A debate event stamped with when it was emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub event: DebateEvent,
    pub at: DateTime<Utc>,
}

impl EngineEvent {
    pub fn now(event: DebateEvent) -> Self {
        Self {
            event,
            at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminant_matches_payload() {
        assert_eq!(
            DebateEvent::ConsensusReached { confidence: 91.5 }.kind(),
            EventKind::ConsensusReached
        );
        assert_eq!(
            DebateEvent::BeginRound { round: 2 }.kind(),
            EventKind::BeginRound
        );
        assert_eq!(DebateEvent::AllClear.kind(), EventKind::AllClear);
    }

    #[test]
    fn test_engine_event_is_timestamped() {
        let before = Utc::now();
        let event = EngineEvent::now(DebateEvent::Start);
        assert!(event.at >= before);
        assert_eq!(event.kind(), EventKind::Start);
    }

    #[test]
    fn test_event_serde_tag() {
        let event = DebateEvent::ConsensusReached { confidence: 88.0 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "consensus_reached");
        assert_eq!(json["confidence"], 88.0);
    }
}
