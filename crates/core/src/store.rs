//! Persistence capability of a debate store.
//!
//! The orchestrator never holds debate state as an authoritative
//! in-memory object: every durable mutation goes through this trait and
//! every step reloads, so a process restart can resume a suspended
//! debate from the id and suspend-node string alone.
//!
//! Implementations must serialize concurrent writes against the same
//! debate id internally (fan-out phases issue `add_contribution` /
//! `add_summary` calls in parallel); callers have no ordering obligation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AgentClarifications, Contribution, DebateState, Solution};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Debate not found: {0}")]
    NotFound(Uuid),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DebateStore: Send + Sync {
    /// Create a debate in `pending` status, optionally with a caller-chosen id.
    async fn create_debate(
        &self,
        problem: &str,
        context: Option<&str>,
        id: Option<Uuid>,
    ) -> Result<DebateState, StoreError>;

    async fn get_debate(&self, id: Uuid) -> Result<Option<DebateState>, StoreError>;

    /// Append a new round, bump `current_round`, and return the new
    /// round number. Marks the debate `running`.
    async fn begin_round(&self, id: Uuid) -> Result<u32, StoreError>;

    /// Append a contribution to the active round.
    async fn add_contribution(&self, id: Uuid, contribution: Contribution)
        -> Result<(), StoreError>;

    /// Record an agent's context summary on the active round.
    async fn add_summary(&self, id: Uuid, agent_id: &str, summary: &str)
        -> Result<(), StoreError>;

    async fn add_judge_summary(&self, id: Uuid, summary: &str) -> Result<(), StoreError>;

    /// Replace the debate's clarification groups.
    async fn set_clarifications(
        &self,
        id: Uuid,
        items: Vec<AgentClarifications>,
    ) -> Result<(), StoreError>;

    async fn set_clarification_iterations(&self, id: Uuid, iterations: u32)
        -> Result<(), StoreError>;

    /// Persist the suspend marker: node kind string + timestamp.
    async fn set_suspend_state(
        &self,
        id: Uuid,
        node: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn clear_suspend_state(&self, id: Uuid) -> Result<(), StoreError>;

    /// Persist the final solution and mark the debate `completed`.
    async fn complete_debate(&self, id: Uuid, solution: Solution) -> Result<(), StoreError>;

    /// Mark the debate `failed` with the error string.
    async fn fail_debate(&self, id: Uuid, error: &str) -> Result<(), StoreError>;

    async fn list_debates(&self) -> Result<Vec<DebateState>, StoreError>;
}
