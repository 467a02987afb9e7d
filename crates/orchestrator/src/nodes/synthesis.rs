use async_trait::async_trait;
use events::Event;
use std::time::Instant;
use tracing::info;

use crate::context::NodeContext;
use crate::error::{OrchestratorError, Result};
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// The judge condenses the transcript, synthesizes the final solution,
/// and the debate is marked completed. The emitted `Complete` resolves
/// to no next node, which the loop validates as the terminal.
pub struct SynthesisNode;

#[async_trait]
impl DebateNode for SynthesisNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Synthesis
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let prepared = ctx
            .judge
            .prepare_context(&ctx.state.rounds)
            .await
            .map_err(|err| OrchestratorError::judge_task(NodeKind::Synthesis, err))?;

        if let Some(summary) = &prepared.summary {
            ctx.store.add_judge_summary(ctx.state.id, summary).await?;
        }

        let context = if prepared.context.trim().is_empty() {
            ctx.base_context()
        } else {
            prepared.context
        };

        let started = Instant::now();
        let solution = ctx
            .judge
            .synthesize(&ctx.state.problem, &ctx.state.rounds, &context)
            .await
            .map_err(|err| OrchestratorError::judge_task(NodeKind::Synthesis, err))?;
        ctx.trace(|t| {
            t.generation_recorded(
                &ctx.state.id.to_string(),
                NodeKind::Synthesis.as_str(),
                &ctx.judge.profile().id,
                &solution.model,
                0,
                started.elapsed().as_millis() as u64,
            )
        });

        info!(
            debate_id = %ctx.state.id,
            total_rounds = ctx.state.current_round,
            model = %solution.model,
            "debate completed"
        );
        ctx.store.complete_debate(ctx.state.id, solution).await?;
        ctx.emit(Event::DebateCompleted {
            debate_id: ctx.state.id,
            total_rounds: ctx.state.current_round,
        });

        Ok(NodeOutcome::event(EngineEvent::now(DebateEvent::Complete)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;
    use parley_core::DebateStatus;

    #[tokio::test]
    async fn test_completes_debate_in_store() {
        let mut ctx = context_with_round(1, 3);
        let created = ctx
            .store
            .create_debate("test problem", None, Some(ctx.state.id))
            .await
            .unwrap();
        ctx.state = created;

        let outcome = SynthesisNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::Complete);

        let stored = ctx.store.get_debate(ctx.state.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DebateStatus::Completed);
        assert!(stored.final_solution.is_some());
    }
}
