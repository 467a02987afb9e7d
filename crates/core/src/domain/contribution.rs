use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    Proposal,
    Critique,
    Refinement,
}

impl ContributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::Critique => "critique",
            Self::Refinement => "refinement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposal" => Some(Self::Proposal),
            "critique" => Some(Self::Critique),
            "refinement" => Some(Self::Refinement),
            _ => None,
        }
    }
}

/// Provenance of a contribution.
///
/// Every persisted contribution carries a model identifier and a
/// non-negative latency; carried-over contributions are stamped with
/// zero latency and zero tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionMetadata {
    pub model: String,
    pub latency_ms: u64,
    pub tokens_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
}

impl ContributionMetadata {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            latency_ms: 0,
            tokens_used: 0,
            tool_calls: None,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_tokens(mut self, tokens_used: u32) -> Self {
        self.tokens_used = tokens_used;
        self
    }
}

/// A single agent output within a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub agent_id: String,
    pub agent_role: String,
    #[serde(rename = "type")]
    pub kind: ContributionType,
    pub content: String,
    pub metadata: ContributionMetadata,
    /// For critiques only: the agent whose proposal is being critiqued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_round_trip() {
        for t in [
            ContributionType::Proposal,
            ContributionType::Critique,
            ContributionType::Refinement,
        ] {
            assert_eq!(ContributionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ContributionType::parse("summary"), None);
    }

    #[test]
    fn test_metadata_builder() {
        let meta = ContributionMetadata::new("gpt-test")
            .with_latency(120)
            .with_tokens(512);
        assert_eq!(meta.model, "gpt-test");
        assert_eq!(meta.latency_ms, 120);
        assert_eq!(meta.tokens_used, 512);
        assert!(meta.tool_calls.is_none());
    }

    #[test]
    fn test_contribution_serde_uses_type_tag() {
        let c = Contribution {
            agent_id: "a1".into(),
            agent_role: "skeptic".into(),
            kind: ContributionType::Critique,
            content: "weak on edge cases".into(),
            metadata: ContributionMetadata::new("m"),
            target_agent_id: Some("a2".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "critique");
        assert_eq!(json["target_agent_id"], "a2");
    }
}
