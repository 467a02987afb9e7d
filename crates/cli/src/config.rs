//! `.parley/config.toml` handling.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use orchestrator::{DebateConfig, TerminationMode};
use parley_core::AgentProfile;

#[derive(Debug, Serialize, Deserialize)]
pub struct ParleyConfig {
    pub provider: ProviderConfig,
    pub debate: DebateSection,
    pub agents: Vec<AgentEntry>,
    pub judge: AgentEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key. The key itself never
    /// lives in the config file.
    pub api_key_env: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DebateSection {
    pub rounds: u32,
    pub interactive_clarifications: bool,
    pub max_clarification_iterations: u32,
    pub max_questions_per_agent: usize,
    /// Set to enable convergence-based early termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convergence_threshold: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub model: String,
}

impl AgentEntry {
    pub fn profile(&self) -> AgentProfile {
        AgentProfile::new(&self.id, &self.name, &self.role, &self.model)
    }
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                api_key_env: "OPENROUTER_API_KEY".to_string(),
            },
            debate: DebateSection {
                rounds: 3,
                interactive_clarifications: false,
                max_clarification_iterations: 3,
                max_questions_per_agent: 3,
                convergence_threshold: None,
            },
            agents: vec![
                AgentEntry {
                    id: "optimist".to_string(),
                    name: "Optimist".to_string(),
                    role: "advocate for the most ambitious workable solution".to_string(),
                    model: "anthropic/claude-sonnet-4".to_string(),
                },
                AgentEntry {
                    id: "skeptic".to_string(),
                    name: "Skeptic".to_string(),
                    role: "devil's advocate focused on risks and failure modes".to_string(),
                    model: "openai/gpt-4o".to_string(),
                },
                AgentEntry {
                    id: "pragmatist".to_string(),
                    name: "Pragmatist".to_string(),
                    role: "engineer optimizing for simplicity and delivery".to_string(),
                    model: "google/gemini-2.5-pro".to_string(),
                },
            ],
            judge: AgentEntry {
                id: "judge".to_string(),
                name: "Judge".to_string(),
                role: "judge".to_string(),
                model: "anthropic/claude-sonnet-4".to_string(),
            },
        }
    }
}

impl ParleyConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Engine configuration from the config file, with CLI overrides.
    pub fn debate_config(
        &self,
        rounds: Option<u32>,
        interactive: bool,
        convergence: bool,
    ) -> DebateConfig {
        let mut config = DebateConfig::new(rounds.unwrap_or(self.debate.rounds))
            .with_interactive_clarifications(
                interactive || self.debate.interactive_clarifications,
            )
            .with_max_clarification_iterations(self.debate.max_clarification_iterations);
        config.max_questions_per_agent = self.debate.max_questions_per_agent;

        if convergence || self.debate.convergence_threshold.is_some() {
            config = config.with_termination(match self.debate.convergence_threshold {
                Some(threshold) => TerminationMode::Convergence { threshold },
                None => TerminationMode::convergence(),
            });
        }
        config
    }

    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.provider.api_key_env).with_context(|| {
            format!(
                "API key not found: set the {} environment variable",
                self.provider.api_key_env
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = ParleyConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: ParleyConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.agents.len(), 3);
        assert_eq!(back.debate.rounds, 3);
        assert!(back.debate.convergence_threshold.is_none());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = ParleyConfig::default();
        let debate = config.debate_config(Some(5), true, true);
        assert_eq!(debate.rounds, 5);
        assert!(debate.interactive_clarifications);
        assert!(matches!(
            debate.termination,
            TerminationMode::Convergence { .. }
        ));
    }
}
