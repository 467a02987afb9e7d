use async_trait::async_trait;
use chrono::Utc;
use events::Event;
use futures::future::try_join_all;
use std::time::Instant;

use parley_core::{Contribution, ContributionMetadata, ContributionType};

use crate::context::{build_contribution, NodeContext};
use crate::error::{OrchestratorError, Result};
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Gathers one proposal per agent, concurrently.
///
/// From round two onward an agent's refinement from the previous round
/// is carried over verbatim as its proposal, stamped with zero latency
/// and zero tokens. An agent missing its previous refinement gets a
/// fresh proposal call after a recovered warning.
pub struct ProposalNode;

#[async_trait]
impl DebateNode for ProposalNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Proposal
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let round = ctx.state.current_round;

        let tasks = ctx.agents.iter().map(|agent| async move {
            let profile = agent.profile();

            if round > 1 {
                let carried = ctx
                    .state
                    .previous_round()
                    .and_then(|prev| {
                        prev.contribution_by(&profile.id, ContributionType::Refinement)
                    })
                    .map(|refinement| Contribution {
                        agent_id: profile.id.clone(),
                        agent_role: profile.role.clone(),
                        kind: ContributionType::Proposal,
                        content: refinement.content.clone(),
                        metadata: ContributionMetadata::new(refinement.metadata.model.clone()),
                        target_agent_id: None,
                        created_at: Utc::now(),
                    });

                if let Some(contribution) = carried {
                    persist(ctx, round, contribution).await?;
                    return Ok::<_, OrchestratorError>(());
                }

                ctx.warn(format!(
                    "Missing previous refinement for agent {} in round {}, requesting a fresh proposal",
                    profile.id,
                    round - 1
                ));
            }

            let started = Instant::now();
            let reply = agent
                .propose(&ctx.state.problem, &ctx.context_for(&profile.id), &ctx.state)
                .await
                .map_err(|err| {
                    OrchestratorError::agent_task(NodeKind::Proposal, &profile.id, err)
                })?;

            let contribution =
                build_contribution(profile, ContributionType::Proposal, reply, started, None);
            ctx.record_generation(NodeKind::Proposal, &contribution);
            persist(ctx, round, contribution).await?;
            Ok(())
        });

        try_join_all(tasks).await?;
        Ok(NodeOutcome::event(EngineEvent::now(
            DebateEvent::ProposalsComplete,
        )))
    }
}

async fn persist(ctx: &NodeContext, round: u32, contribution: Contribution) -> Result<()> {
    let agent_id = contribution.agent_id.clone();
    ctx.store.add_contribution(ctx.state.id, contribution).await?;
    ctx.emit(Event::ContributionAdded {
        debate_id: ctx.state.id,
        round,
        agent_id,
        kind: ContributionType::Proposal.as_str().to_string(),
        activity: "proposing".to_string(),
    });
    Ok(())
}
