//! The world a node sees while executing.
//!
//! A single context struct carries the reloaded debate state, the
//! run configuration, the collaborators, the store handle and the
//! per-run prepared contexts. Nodes receive it immutably; in-memory
//! changes travel back as a `ContextPatch`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use events::{Event, EventBus, EventEnvelope};
use parley_core::{
    Agent, AgentProfile, AgentReply, Contribution, ContributionMetadata, ContributionType,
    DebateState, DebateStore, Judge,
};
use tracing::warn;

use crate::config::DebateConfig;
use crate::graph::NodeKind;
use crate::trace::{TraceError, TraceSink};

pub struct NodeContext {
    /// Debate state as of the last reload from the store.
    pub state: DebateState,
    pub config: DebateConfig,
    pub agents: Vec<Arc<dyn Agent>>,
    pub judge: Arc<dyn Judge>,
    pub store: Arc<dyn DebateStore>,
    /// Per-agent contexts prepared by the summarization phase.
    /// In-memory only; empty until the first summarization of a run.
    pub prepared_contexts: HashMap<String, String>,
    pub bus: Option<EventBus>,
    pub tracer: Option<Arc<dyn TraceSink>>,
}

impl NodeContext {
    pub fn agent_by_id(&self, agent_id: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.profile().id == agent_id)
    }

    /// The context string an agent debates with: its prepared context
    /// when summarization ran, the shared base context otherwise.
    pub fn context_for(&self, agent_id: &str) -> String {
        self.prepared_contexts
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| self.base_context())
    }

    /// The shared context assembled from the debate state.
    pub fn base_context(&self) -> String {
        let mut sections = vec![format!("Problem:\n{}", self.state.problem)];

        if let Some(extra) = &self.state.context {
            if !extra.trim().is_empty() {
                sections.push(format!("Additional context:\n{extra}"));
            }
        }

        if self.config.include_clarifications {
            if let Some(block) = self.clarifications_block() {
                sections.push(block);
            }
        }

        if self.config.include_history {
            if let Some(block) = self.history_block() {
                sections.push(block);
            }
        }

        if let Some(dir) = &self.config.context_dir {
            sections.push(format!(
                "Reference material is available under {}.",
                dir.display()
            ));
        }

        sections.join("\n\n")
    }

    fn clarifications_block(&self) -> Option<String> {
        let groups = self.state.clarifications.as_ref()?;
        let mut lines = Vec::new();
        for group in groups {
            for item in &group.items {
                if item.is_answered() {
                    lines.push(format!("Q: {}\nA: {}", item.question, item.answer));
                }
            }
        }
        if lines.is_empty() {
            return None;
        }
        Some(format!("Clarifications:\n{}", lines.join("\n")))
    }

    fn history_block(&self) -> Option<String> {
        let mut lines = Vec::new();
        for round in &self.state.rounds {
            if round.round_number >= self.state.current_round {
                continue;
            }
            for c in &round.contributions {
                lines.push(format!(
                    "[round {} / {}] {} ({}):\n{}",
                    round.round_number,
                    c.kind.as_str(),
                    c.agent_id,
                    c.agent_role,
                    c.content
                ));
            }
        }
        if lines.is_empty() {
            return None;
        }
        Some(format!("Debate so far:\n{}", lines.join("\n\n")))
    }

    /// Publish a notification event. Fire-and-forget.
    pub fn emit(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(EventEnvelope::new(event));
        }
    }

    /// Record a recovered, non-fatal condition. Logged and published
    /// as an engine warning; never changes the debate outcome.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(debate_id = %self.state.id, "{message}");
        self.emit(Event::EngineWarning {
            debate_id: self.state.id,
            message,
        });
    }

    /// Run a trace sink call in a sandbox. Sink errors are logged and
    /// discarded.
    pub fn trace(&self, f: impl FnOnce(&dyn TraceSink) -> Result<(), TraceError>) {
        if let Some(tracer) = &self.tracer {
            if let Err(err) = f(tracer.as_ref()) {
                warn!(debate_id = %self.state.id, "{err}");
            }
        }
    }

    /// Hand a finished generation to the trace sink. Carried-over
    /// contributions are not generations and are never recorded.
    pub fn record_generation(&self, node: NodeKind, contribution: &Contribution) {
        self.trace(|t| {
            t.generation_recorded(
                &self.state.id.to_string(),
                node.as_str(),
                &contribution.agent_id,
                &contribution.metadata.model,
                contribution.metadata.tokens_used,
                contribution.metadata.latency_ms,
            )
        });
    }
}

/// Assemble a persistable contribution from an agent reply.
///
/// Latency falls back to the measured wall clock and the model to the
/// agent's configured one when the reply does not report them.
pub fn build_contribution(
    profile: &AgentProfile,
    kind: ContributionType,
    reply: AgentReply,
    started: Instant,
    target_agent_id: Option<String>,
) -> Contribution {
    let latency_ms = reply
        .metadata
        .latency_ms
        .unwrap_or_else(|| started.elapsed().as_millis() as u64);
    let model = reply
        .metadata
        .model
        .unwrap_or_else(|| profile.model.clone());
    let mut metadata = ContributionMetadata::new(model)
        .with_latency(latency_ms)
        .with_tokens(reply.metadata.tokens_used.unwrap_or(0));
    metadata.tool_calls = reply.metadata.tool_calls;

    Contribution {
        agent_id: profile.id.clone(),
        agent_role: profile.role.clone(),
        kind,
        content: reply.content,
        metadata,
        target_agent_id,
        created_at: chrono::Utc::now(),
    }
}
