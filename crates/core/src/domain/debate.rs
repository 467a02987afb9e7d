use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::clarification::AgentClarifications;
use super::contribution::{Contribution, ContributionType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl DebateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One propose → critique → refine iteration across all agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// 1-indexed round number.
    pub round_number: u32,
    pub contributions: Vec<Contribution>,
    /// Per-agent context summaries produced during summarization, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summaries: Option<HashMap<String, String>>,
    pub started_at: DateTime<Utc>,
}

impl Round {
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            contributions: Vec::new(),
            summaries: None,
            started_at: Utc::now(),
        }
    }

    /// Find a contribution of the given type by the given agent.
    pub fn contribution_by(
        &self,
        agent_id: &str,
        kind: ContributionType,
    ) -> Option<&Contribution> {
        self.contributions
            .iter()
            .find(|c| c.agent_id == agent_id && c.kind == kind)
    }

    /// All contributions of the given type, in insertion order.
    pub fn contributions_of(&self, kind: ContributionType) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.kind == kind)
            .collect()
    }

    /// Critiques whose target is the given agent.
    pub fn critiques_targeting(&self, agent_id: &str) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| {
                c.kind == ContributionType::Critique
                    && c.target_agent_id.as_deref() == Some(agent_id)
            })
            .collect()
    }
}

/// The judge's final synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub content: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl Solution {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            confidence: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Durable state of one debate run.
///
/// Invariants: `rounds.len() == current_round` once rounds exist, the last
/// round is the active one, and `suspended_at_node` is set exactly when
/// the debate is paused awaiting external clarification answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateState {
    pub id: Uuid,
    pub problem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub status: DebateStatus,
    /// Monotonic, starts at 0; bumped by the store when a round begins.
    pub current_round: u32,
    pub rounds: Vec<Round>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarifications: Option<Vec<AgentClarifications>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_iterations: Option<u32>,
    /// Node kind string where the debate suspended, if suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_solution: Option<Solution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebateState {
    pub fn new(problem: impl Into<String>, context: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            problem: problem.into(),
            context,
            status: DebateStatus::default(),
            current_round: 0,
            rounds: Vec::new(),
            clarifications: None,
            clarification_iterations: None,
            suspended_at_node: None,
            suspended_at: None,
            final_solution: None,
            judge_summary: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// The active round, always the last one.
    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn active_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut()
    }

    /// The round preceding the active one, if any.
    pub fn previous_round(&self) -> Option<&Round> {
        let n = self.rounds.len();
        if n >= 2 {
            self.rounds.get(n - 2)
        } else {
            None
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at_node.is_some()
    }

    /// Whether any clarification item is still awaiting an answer.
    pub fn has_unanswered_clarifications(&self) -> bool {
        self.clarifications
            .as_deref()
            .map(|groups| {
                groups
                    .iter()
                    .any(|g| g.items.iter().any(|item| !item.is_answered()))
            })
            .unwrap_or(false)
    }
}
