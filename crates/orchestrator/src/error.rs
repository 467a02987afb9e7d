use parley_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::graph::NodeKind;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Debate not found: {0}")]
    DebateNotFound(Uuid),

    #[error("Debate {0} is not suspended")]
    NotSuspended(Uuid),

    #[error("Debate {debate_id} has an unknown suspend node: {node}")]
    UnknownSuspendNode { debate_id: Uuid, node: String },

    #[error("Agent {agent_id} failed during {phase}: {reason}")]
    AgentTask {
        phase: NodeKind,
        agent_id: String,
        reason: String,
    },

    #[error("Judge failed during {phase}: {reason}")]
    JudgeTask { phase: NodeKind, reason: String },

    #[error("Debate {0} reached a terminal transition without a final solution")]
    IncompleteTerminalState(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    pub fn agent_task(
        phase: NodeKind,
        agent_id: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::AgentTask {
            phase,
            agent_id: agent_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn judge_task(phase: NodeKind, reason: impl ToString) -> Self {
        Self::JudgeTask {
            phase,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
