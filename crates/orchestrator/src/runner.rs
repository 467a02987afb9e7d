//! The debate execution loop.
//!
//! Durable state lives in the store; the loop reloads it before every
//! node so nothing decision-relevant exists only in memory. The one
//! exception is the prepared-contexts map, which is per-run by design
//! and rebuilt by the summarization phase after a resume.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use events::{Event, EventBus, EventEnvelope};
use parley_core::{Agent, AgentClarifications, DebateState, DebateStore, Judge, Round, Solution};

use crate::config::DebateConfig;
use crate::context::NodeContext;
use crate::error::{OrchestratorError, Result};
use crate::events::EventKind;
use crate::graph::{NodeKind, TransitionGraph};
use crate::node::node_for;
use crate::trace::TraceSink;

/// Why a run returned without a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    WaitingForInput,
}

/// Everything a caller needs to collect answers and resume.
#[derive(Debug, Clone)]
pub struct SuspendedPayload {
    pub debate_id: Uuid,
    pub questions: Vec<AgentClarifications>,
    pub iteration: u32,
}

#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub total_rounds: u32,
    pub duration_ms: u64,
}

/// Outcome of `run_debate` / `resume`.
#[derive(Debug)]
pub enum ExecutionResult {
    Completed {
        debate_id: Uuid,
        solution: Solution,
        rounds: Vec<Round>,
        metadata: RunMetadata,
    },
    Suspended {
        reason: SuspendReason,
        payload: SuspendedPayload,
    },
}

/// Runs debates over the transition graph, one node at a time.
pub struct DebateOrchestrator {
    store: Arc<dyn DebateStore>,
    agents: Vec<Arc<dyn Agent>>,
    judge: Arc<dyn Judge>,
    config: DebateConfig,
    graph: TransitionGraph,
    bus: Option<EventBus>,
    tracer: Option<Arc<dyn TraceSink>>,
}

impl DebateOrchestrator {
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
            graph: TransitionGraph::standard(),
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

    /// Create and run a debate to completion or suspension.
    ///
    /// Pre-seeded clarifications (answers gathered out of band) are
    /// persisted before the first node when any group carries items.
    /// Callers that allocate the debate id up front (to hand out before
    /// the run starts) pass it as `debate_id`.
    pub async fn run_debate(
        &self,
        problem: &str,
        context: Option<&str>,
        clarifications: Option<Vec<AgentClarifications>>,
        debate_id: Option<Uuid>,
    ) -> Result<ExecutionResult> {
        let state = self.store.create_debate(problem, context, debate_id).await?;

        if let Some(groups) = clarifications {
            if groups.iter().any(|g| !g.items.is_empty()) {
                self.store.set_clarifications(state.id, groups).await?;
            }
        }

        self.execute_from_node(state.id, NodeKind::Initialization)
            .await
    }

    /// Resume a suspended debate with the collected answers.
    ///
    /// Answers are merged into the persisted question set by item id;
    /// an already answered item is never overwritten. Execution
    /// re-enters at the persisted suspend node.
    pub async fn resume(
        &self,
        debate_id: Uuid,
        answers: Vec<AgentClarifications>,
    ) -> Result<ExecutionResult> {
        let state = self.load(debate_id).await?;
        let node_str = state
            .suspended_at_node
            .clone()
            .ok_or(OrchestratorError::NotSuspended(debate_id))?;
        let node = NodeKind::parse(&node_str).ok_or(OrchestratorError::UnknownSuspendNode {
            debate_id,
            node: node_str.clone(),
        })?;

        let merged = merge_answers(state.clarifications.unwrap_or_default(), answers);
        self.store.set_clarifications(debate_id, merged).await?;
        self.store.clear_suspend_state(debate_id).await?;

        self.emit(Event::DebateResumed {
            debate_id,
            node: node_str,
        });
        self.execute_from_node(debate_id, node).await
    }

    /// The core loop: reload, execute, route, until a `None` next node.
    async fn execute_from_node(
        &self,
        debate_id: Uuid,
        start: NodeKind,
    ) -> Result<ExecutionResult> {
        let mut current = start;
        let mut prepared_contexts: HashMap<String, String> = HashMap::new();

        loop {
            let state = self.load(debate_id).await?;
            let mut ctx = NodeContext {
                state,
                config: self.config.clone(),
                agents: self.agents.clone(),
                judge: Arc::clone(&self.judge),
                store: Arc::clone(&self.store),
                prepared_contexts: std::mem::take(&mut prepared_contexts),
                bus: self.bus.clone(),
                tracer: self.tracer.clone(),
            };

            debug!(debate_id = %debate_id, node = %current, "executing node");
            self.emit(Event::PhaseStarted {
                debate_id,
                node: current.as_str().to_string(),
            });
            ctx.trace(|t| t.span_started(&debate_id.to_string(), current.as_str()));

            let outcome = match node_for(current).execute(&ctx).await {
                Ok(outcome) => {
                    ctx.trace(|t| t.span_completed(&debate_id.to_string(), current.as_str(), true));
                    outcome
                }
                Err(err) => {
                    ctx.trace(|t| {
                        t.span_completed(&debate_id.to_string(), current.as_str(), false)
                    });
                    return Err(self.fail(debate_id, err).await);
                }
            };

            let kind = outcome.event.kind();
            self.emit(Event::PhaseCompleted {
                debate_id,
                node: current.as_str().to_string(),
                emitted: kind.as_str().to_string(),
            });

            if let Some(patch) = outcome.patch {
                patch.apply(&mut ctx);
            }

            let next = self.graph.next_node(current, kind, &ctx);

            if kind == EventKind::WaitingForInput && next.is_none() {
                return self.suspend(debate_id, current).await;
            }

            match next {
                Some(node) => {
                    prepared_contexts = ctx.prepared_contexts;
                    current = node;
                }
                None => return self.finish(debate_id).await,
            }
        }
    }

    /// Persist the suspend marker and hand the pending questions back.
    async fn suspend(&self, debate_id: Uuid, node: NodeKind) -> Result<ExecutionResult> {
        self.store
            .set_suspend_state(debate_id, node.as_str(), Utc::now())
            .await?;

        let state = self.load(debate_id).await?;
        let questions = state.clarifications.unwrap_or_default();
        let pending = questions
            .iter()
            .map(|g| g.items.iter().filter(|i| !i.is_answered()).count())
            .sum();

        self.emit(Event::DebateSuspended {
            debate_id,
            node: node.as_str().to_string(),
            pending_questions: pending,
        });

        Ok(ExecutionResult::Suspended {
            reason: SuspendReason::WaitingForInput,
            payload: SuspendedPayload {
                debate_id,
                questions,
                iteration: state.clarification_iterations.unwrap_or(1),
            },
        })
    }

    /// Validate the terminal: a `None` next node outside a suspension
    /// must leave a completed debate behind.
    async fn finish(&self, debate_id: Uuid) -> Result<ExecutionResult> {
        let state = self.load(debate_id).await?;
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
            None => Err(self
                .fail(debate_id, OrchestratorError::IncompleteTerminalState(debate_id))
                .await),
        }
    }

    /// Mark the debate failed and publish the failure. Returns the
    /// original error for propagation; a store failure while failing
    /// is logged and swallowed.
    async fn fail(&self, debate_id: Uuid, err: OrchestratorError) -> OrchestratorError {
        let reason = err.to_string();
        error!(debate_id = %debate_id, "{reason}");
        if let Err(store_err) = self.store.fail_debate(debate_id, &reason).await {
            warn!(debate_id = %debate_id, "could not mark debate failed: {store_err}");
        }
        self.emit(Event::DebateFailed { debate_id, reason });
        err
    }

    async fn load(&self, debate_id: Uuid) -> Result<DebateState> {
        self.store
            .get_debate(debate_id)
            .await?
            .ok_or(OrchestratorError::DebateNotFound(debate_id))
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(EventEnvelope::new(event));
        }
    }
}

/// Fill answers into the stored question set by (agent, item id).
/// Stored answers win over incoming ones; unknown ids are ignored.
fn merge_answers(
    mut stored: Vec<AgentClarifications>,
    answers: Vec<AgentClarifications>,
) -> Vec<AgentClarifications> {
    for group in answers {
        let Some(slot) = stored.iter_mut().find(|g| g.agent_id == group.agent_id) else {
            continue;
        };
        for answered in group.items {
            if !answered.is_answered() {
                continue;
            }
            if let Some(item) = slot
                .items
                .iter_mut()
                .find(|i| i.id == answered.id && !i.is_answered())
            {
                item.answer = answered.answer;
            }
        }
    }
    stored
}
