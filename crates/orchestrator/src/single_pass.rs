//! Sequential debate runner without the transition graph.
//!
//! Runs the same phase nodes in their canonical order with no suspend
//! support: interactive clarifications are forced off, so the debate
//! always runs front to back in one process. Useful for embedding and
//! for batch runs where nobody can answer questions anyway.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use events::{Event, EventBus, EventEnvelope};
use parley_core::{Agent, DebateStore, Judge};

use crate::config::DebateConfig;
use crate::context::NodeContext;
use crate::error::{OrchestratorError, Result};
use crate::events::EventKind;
use crate::node::DebateNode;
use crate::nodes::{
    ClarificationNode, CritiqueNode, EvaluationNode, InitializationNode, ProposalNode,
    RefinementNode, RoundManagerNode, SummarizationNode, SynthesisNode,
};
use crate::runner::{ExecutionResult, RunMetadata};
use crate::trace::TraceSink;

pub struct SinglePassOrchestrator {
    store: Arc<dyn DebateStore>,
    agents: Vec<Arc<dyn Agent>>,
    judge: Arc<dyn Judge>,
    config: DebateConfig,
    bus: Option<EventBus>,
    tracer: Option<Arc<dyn TraceSink>>,
}

impl SinglePassOrchestrator {
    pub fn new(
        store: Arc<dyn DebateStore>,
        agents: Vec<Arc<dyn Agent>>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        Self {
            store,
            agents,
            judge,
            config: DebateConfig::default(),
            bus: None,
            tracer: None,
        }
    }

    pub fn with_config(mut self, config: DebateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TraceSink>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Run a full debate sequentially. Always returns
    /// `ExecutionResult::Completed` on success.
    pub async fn run(&self, problem: &str, context: Option<&str>) -> Result<ExecutionResult> {
        let mut config = self.config.clone();
        config.interactive_clarifications = false;

        let state = self.store.create_debate(problem, context, None).await?;
        let debate_id = state.id;
        let mut prepared: HashMap<String, String> = HashMap::new();

        self.step(debate_id, &config, &mut prepared, &InitializationNode)
            .await?;
        // With interactive clarifications off this is always all-clear,
        // keeping both runners' phase traces aligned.
        self.step(debate_id, &config, &mut prepared, &ClarificationNode)
            .await?;

        loop {
            let opened = self
                .step(debate_id, &config, &mut prepared, &RoundManagerNode)
                .await?;
            if opened == EventKind::MaxRoundsReached {
                break;
            }

            self.step(debate_id, &config, &mut prepared, &SummarizationNode)
                .await?;
            self.step(debate_id, &config, &mut prepared, &ProposalNode)
                .await?;
            self.step(debate_id, &config, &mut prepared, &CritiqueNode)
                .await?;
            self.step(debate_id, &config, &mut prepared, &RefinementNode)
                .await?;

            let verdict = self
                .step(debate_id, &config, &mut prepared, &EvaluationNode)
                .await?;
            if matches!(
                verdict,
                EventKind::ConsensusReached | EventKind::MaxRoundsReached
            ) {
                break;
            }
        }

        self.step(debate_id, &config, &mut prepared, &SynthesisNode)
            .await?;

        let state = self
            .store
            .get_debate(debate_id)
            .await?
            .ok_or(OrchestratorError::DebateNotFound(debate_id))?;
        match state.final_solution {
            Some(solution) => {
                let duration_ms =
                    (Utc::now() - state.created_at).num_milliseconds().max(0) as u64;
                Ok(ExecutionResult::Completed {
                    debate_id,
                    solution,
                    rounds: state.rounds,
                    metadata: RunMetadata {
                        total_rounds: state.current_round,
                        duration_ms,
                    },
                })
            }
            None => {
                Err(self
                    .fail(debate_id, OrchestratorError::IncompleteTerminalState(debate_id))
                    .await)
            }
        }
    }

    /// Reload state, execute one node, fold its patch back in, and
    /// return the emitted event kind.
    async fn step(
        &self,
        debate_id: Uuid,
        config: &DebateConfig,
        prepared: &mut HashMap<String, String>,
        node: &dyn DebateNode,
    ) -> Result<EventKind> {
        let state = self
            .store
            .get_debate(debate_id)
            .await?
            .ok_or(OrchestratorError::DebateNotFound(debate_id))?;

        let mut ctx = NodeContext {
            state,
            config: config.clone(),
            agents: self.agents.clone(),
            judge: Arc::clone(&self.judge),
            store: Arc::clone(&self.store),
            prepared_contexts: std::mem::take(prepared),
            bus: self.bus.clone(),
            tracer: self.tracer.clone(),
        };

        self.emit(Event::PhaseStarted {
            debate_id,
            node: node.kind().as_str().to_string(),
        });
        ctx.trace(|t| t.span_started(&debate_id.to_string(), node.kind().as_str()));

        let outcome = match node.execute(&ctx).await {
            Ok(outcome) => {
                ctx.trace(|t| t.span_completed(&debate_id.to_string(), node.kind().as_str(), true));
                outcome
            }
            Err(err) => {
                ctx.trace(|t| {
                    t.span_completed(&debate_id.to_string(), node.kind().as_str(), false)
                });
                return Err(self.fail(debate_id, err).await);
            }
        };

        let kind = outcome.event.kind();
        self.emit(Event::PhaseCompleted {
            debate_id,
            node: node.kind().as_str().to_string(),
            emitted: kind.as_str().to_string(),
        });

        if let Some(patch) = outcome.patch {
            patch.apply(&mut ctx);
        }
        *prepared = ctx.prepared_contexts;

        Ok(kind)
    }

    async fn fail(&self, debate_id: Uuid, err: OrchestratorError) -> OrchestratorError {
        let reason = err.to_string();
        error!(debate_id = %debate_id, "{reason}");
        if let Err(store_err) = self.store.fail_debate(debate_id, &reason).await {
            warn!(debate_id = %debate_id, "could not mark debate failed: {store_err}");
        }
        self.emit(Event::DebateFailed { debate_id, reason });
        err
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(EventEnvelope::new(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{NullAgent, NullJudge};
    use db::MemoryDebateStore;

    #[tokio::test]
    async fn test_sequential_run_completes() {
        let orch = SinglePassOrchestrator::new(
            Arc::new(MemoryDebateStore::new()),
            vec![Arc::new(NullAgent::new("a1")), Arc::new(NullAgent::new("a2"))],
            Arc::new(NullJudge::new()),
        )
        .with_config(DebateConfig::new(2));

        let result = orch.run("pick a cache strategy", None).await.unwrap();
        let ExecutionResult::Completed { rounds, metadata, .. } = result else {
            panic!("expected completion");
        };
        assert_eq!(rounds.len(), 2);
        assert_eq!(metadata.total_rounds, 2);
    }

    #[tokio::test]
    async fn test_interactive_clarifications_forced_off() {
        // Even with the flag on, a single-pass run never suspends.
        let config = DebateConfig::new(1).with_interactive_clarifications(true);
        let orch = SinglePassOrchestrator::new(
            Arc::new(MemoryDebateStore::new()),
            vec![Arc::new(NullAgent::new("a1"))],
            Arc::new(NullJudge::new()),
        )
        .with_config(config);

        let result = orch.run("p", None).await.unwrap();
        assert!(matches!(result, ExecutionResult::Completed { .. }));
    }
}
