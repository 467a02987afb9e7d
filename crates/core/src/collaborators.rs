//! Capability traits of the LLM-backed collaborators.
//!
//! The engine orchestrates these; it never constructs prompts or parses
//! model output itself. Implementations live outside the core (see the
//! `agents` crate) or in test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DebateState, Round, Solution};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Agent task failed: {0}")]
    Task(String),
}

/// Static identity of an agent or judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    pub model: String,
}

impl AgentProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            model: model.into(),
        }
    }
}

/// Self-reported call metadata. Fields an agent omits are filled in by
/// the engine (wall-clock latency, the agent's configured model).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub content: String,
    #[serde(default)]
    pub metadata: ReplyMetadata,
}

impl AgentReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: ReplyMetadata::default(),
        }
    }
}

/// Result of an agent's context-preparation pass. `summary` is set when
/// the agent compressed its context and wants the compression recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedContext {
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A clarifying question an agent wants answered before debating.
/// The id is optional on first ask; the engine defaults it to the
/// question's position in the agent's own list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    async fn propose(
        &self,
        problem: &str,
        context: &str,
        state: &DebateState,
    ) -> Result<AgentReply, AgentError>;

    async fn critique(
        &self,
        proposal: &str,
        context: &str,
        state: &DebateState,
    ) -> Result<AgentReply, AgentError>;

    async fn refine(
        &self,
        original: &str,
        critiques: &[String],
        context: &str,
        state: &DebateState,
    ) -> Result<AgentReply, AgentError>;

    /// Prepare (and possibly summarize) this agent's round context.
    async fn prepare_context(
        &self,
        context: &str,
        round_number: u32,
    ) -> Result<PreparedContext, AgentError>;

    /// Ask clarifying questions about the problem. `prior` carries the
    /// existing Q&A when the engine is probing for follow-ups; returning
    /// an empty list signals the agent has nothing further to ask.
    async fn ask_clarifying_questions(
        &self,
        problem: &str,
        context: &str,
        prior: Option<&[crate::domain::AgentClarifications]>,
    ) -> Result<Vec<ClarifyingQuestion>, AgentError>;
}

#[async_trait]
pub trait Judge: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    async fn synthesize(
        &self,
        problem: &str,
        rounds: &[Round],
        context: &str,
    ) -> Result<Solution, AgentError>;

    async fn prepare_context(&self, rounds: &[Round]) -> Result<PreparedContext, AgentError>;

    /// Estimate convergence confidence in `[0, 100]`.
    async fn evaluate_confidence(&self, state: &DebateState) -> Result<f32, AgentError>;
}
