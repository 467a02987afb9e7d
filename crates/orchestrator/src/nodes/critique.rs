use async_trait::async_trait;
use events::Event;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

use parley_core::{Agent, ContributionType};

use crate::context::{build_contribution, NodeContext};
use crate::error::Result;
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Cross-critique: every agent critiques every other agent's proposal,
/// concurrently over the full (critic, proposal) cross product.
///
/// Unlike the other fan-out phases this one lets all pairs settle and
/// keeps the fulfilled ones. A failed pair costs a warning and is
/// dropped; the round continues as long as the others landed.
pub struct CritiqueNode;

#[async_trait]
impl DebateNode for CritiqueNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Critique
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let round = ctx.state.current_round;
        let proposals: Vec<(String, String)> = ctx
            .state
            .active_round()
            .map(|r| {
                r.contributions_of(ContributionType::Proposal)
                    .into_iter()
                    .map(|c| (c.agent_id.clone(), c.content.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut tasks = Vec::new();
        for critic in &ctx.agents {
            for (target_id, content) in &proposals {
                if &critic.profile().id == target_id {
                    continue;
                }
                tasks.push(critique_pair(ctx, Arc::clone(critic), target_id, content));
            }
        }

        let mut failed = 0usize;
        for result in join_all(tasks).await {
            if let Err((critic_id, target_id, reason)) = result {
                failed += 1;
                ctx.warn(format!(
                    "Critique by {critic_id} of {target_id}'s proposal failed: {reason}"
                ));
            }
        }

        if failed > 0 {
            tracing::warn!(
                debate_id = %ctx.state.id,
                round,
                failed,
                "some critique pairs failed"
            );
        }

        Ok(NodeOutcome::event(EngineEvent::now(
            DebateEvent::CritiquesComplete { failed },
        )))
    }
}

/// One critique call plus its persistence. An error anywhere in the
/// pair is reported as (critic, target, reason) for the caller to log.
async fn critique_pair(
    ctx: &NodeContext,
    critic: Arc<dyn Agent>,
    target_id: &str,
    proposal: &str,
) -> std::result::Result<(), (String, String, String)> {
    let profile = critic.profile();
    let started = Instant::now();

    let reply = critic
        .critique(proposal, &ctx.context_for(&profile.id), &ctx.state)
        .await
        .map_err(|err| (profile.id.clone(), target_id.to_string(), err.to_string()))?;

    let contribution = build_contribution(
        profile,
        ContributionType::Critique,
        reply,
        started,
        Some(target_id.to_string()),
    );
    ctx.record_generation(NodeKind::Critique, &contribution);
    ctx.store
        .add_contribution(ctx.state.id, contribution)
        .await
        .map_err(|err| (profile.id.clone(), target_id.to_string(), err.to_string()))?;

    let target_label = ctx
        .agent_by_id(target_id)
        .map(|a| a.profile().name.clone())
        .unwrap_or_else(|| target_id.to_string());
    ctx.emit(Event::ContributionAdded {
        debate_id: ctx.state.id,
        round: ctx.state.current_round,
        agent_id: profile.id.clone(),
        kind: ContributionType::Critique.as_str().to_string(),
        activity: format!("critiquing {target_label}"),
    });
    Ok(())
}
