//! Event types published on the Parley bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp.
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All notification events the engine can publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A debate was created and is about to run.
    #[serde(rename = "debate.started")]
    DebateStarted { debate_id: Uuid, problem: String },

    /// The debate suspended awaiting clarification answers.
    #[serde(rename = "debate.suspended")]
    DebateSuspended {
        debate_id: Uuid,
        node: String,
        pending_questions: usize,
    },

    /// A suspended debate was resumed.
    #[serde(rename = "debate.resumed")]
    DebateResumed { debate_id: Uuid, node: String },

    /// The judge produced the final solution.
    #[serde(rename = "debate.completed")]
    DebateCompleted { debate_id: Uuid, total_rounds: u32 },

    /// The debate failed fatally.
    #[serde(rename = "debate.failed")]
    DebateFailed { debate_id: Uuid, reason: String },

    /// A new round began.
    #[serde(rename = "round.started")]
    RoundStarted { debate_id: Uuid, round: u32 },

    /// A phase node started executing.
    #[serde(rename = "phase.started")]
    PhaseStarted { debate_id: Uuid, node: String },

    /// A phase node finished, emitting the named engine event.
    #[serde(rename = "phase.completed")]
    PhaseCompleted {
        debate_id: Uuid,
        node: String,
        emitted: String,
    },

    /// An agent contribution was persisted.
    #[serde(rename = "contribution.added")]
    ContributionAdded {
        debate_id: Uuid,
        round: u32,
        agent_id: String,
        kind: String,
        /// For critiques: a label naming the critiqued agent.
        activity: String,
    },

    /// An agent's context was summarized before a round.
    #[serde(rename = "context.summarized")]
    ContextSummarized {
        debate_id: Uuid,
        agent_id: String,
        chars_before: usize,
        chars_after: usize,
    },

    /// The judge scored convergence confidence.
    #[serde(rename = "consensus.evaluated")]
    ConsensusEvaluated {
        debate_id: Uuid,
        round: u32,
        confidence: f32,
        threshold: f32,
    },

    /// A recovered, non-fatal engine condition. The debate's outcome is
    /// unaffected; the message describes what was recovered.
    #[serde(rename = "engine.warning")]
    EngineWarning { debate_id: Uuid, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_has_id_and_timestamp() {
        let env = EventEnvelope::new(Event::RoundStarted {
            debate_id: Uuid::new_v4(),
            round: 1,
        });
        assert!(!env.id.is_nil());
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = Event::EngineWarning {
            debate_id: Uuid::new_v4(),
            message: "Missing previous refinement".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "engine.warning");
    }

    #[test]
    fn test_contribution_added_round_trip() {
        let event = Event::ContributionAdded {
            debate_id: Uuid::new_v4(),
            round: 2,
            agent_id: "a1".to_string(),
            kind: "critique".to_string(),
            activity: "critiquing Optimist".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::ContributionAdded { round, kind, .. } => {
                assert_eq!(round, 2);
                assert_eq!(kind, "critique");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
