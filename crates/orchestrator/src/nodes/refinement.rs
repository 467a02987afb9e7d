use async_trait::async_trait;
use events::Event;
use futures::future::try_join_all;
use std::time::Instant;

use parley_core::ContributionType;

use crate::context::{build_contribution, NodeContext};
use crate::error::{OrchestratorError, Result};
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Each agent refines its own proposal against the critiques aimed at
/// it. Concurrent and fail-fast: a refinement is the agent's voice in
/// the next round, so a missing one is fatal here rather than silently
/// degrading later rounds.
pub struct RefinementNode;

#[async_trait]
impl DebateNode for RefinementNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Refinement
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let round = ctx.state.current_round;

        let tasks = ctx.agents.iter().map(|agent| async move {
            let profile = agent.profile();
            let active = ctx.state.active_round().ok_or_else(|| {
                OrchestratorError::agent_task(NodeKind::Refinement, &profile.id, "no active round")
            })?;
            let own = active
                .contribution_by(&profile.id, ContributionType::Proposal)
                .ok_or_else(|| {
                    OrchestratorError::agent_task(
                        NodeKind::Refinement,
                        &profile.id,
                        "no proposal to refine",
                    )
                })?;
            let critiques: Vec<String> = active
                .critiques_targeting(&profile.id)
                .into_iter()
                .map(|c| c.content.clone())
                .collect();

            let started = Instant::now();
            let reply = agent
                .refine(
                    &own.content,
                    &critiques,
                    &ctx.context_for(&profile.id),
                    &ctx.state,
                )
                .await
                .map_err(|err| {
                    OrchestratorError::agent_task(NodeKind::Refinement, &profile.id, err)
                })?;

            let contribution =
                build_contribution(profile, ContributionType::Refinement, reply, started, None);
            ctx.record_generation(NodeKind::Refinement, &contribution);
            ctx.store.add_contribution(ctx.state.id, contribution).await?;
            ctx.emit(Event::ContributionAdded {
                debate_id: ctx.state.id,
                round,
                agent_id: profile.id.clone(),
                kind: ContributionType::Refinement.as_str().to_string(),
                activity: "refining".to_string(),
            });
            Ok::<_, OrchestratorError>(())
        });

        try_join_all(tasks).await?;
        Ok(NodeOutcome::event(EngineEvent::now(
            DebateEvent::RefinementsComplete,
        )))
    }
}
