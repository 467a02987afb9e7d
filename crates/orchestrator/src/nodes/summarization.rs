use async_trait::async_trait;
use events::Event;
use std::collections::HashMap;

use crate::context::NodeContext;
use crate::error::{OrchestratorError, Result};
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{ContextPatch, DebateNode, NodeOutcome};

/// Lets each agent prepare (and possibly compress) its context before
/// the round's proposals. Runs sequentially; context preparation is
/// cheap relative to the debating phases and sequential runs keep the
/// summary events ordered.
pub struct SummarizationNode;

#[async_trait]
impl DebateNode for SummarizationNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Summarization
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let base = ctx.base_context();
        let mut prepared = HashMap::with_capacity(ctx.agents.len());

        for agent in &ctx.agents {
            let profile = agent.profile();
            let result = agent
                .prepare_context(&base, ctx.state.current_round)
                .await
                .map_err(|err| {
                    OrchestratorError::agent_task(NodeKind::Summarization, &profile.id, err)
                })?;

            if let Some(summary) = &result.summary {
                ctx.store
                    .add_summary(ctx.state.id, &profile.id, summary)
                    .await?;
                ctx.emit(Event::ContextSummarized {
                    debate_id: ctx.state.id,
                    agent_id: profile.id.clone(),
                    chars_before: base.len(),
                    chars_after: result.context.len(),
                });
            }
            prepared.insert(profile.id.clone(), result.context);
        }

        Ok(NodeOutcome::with_patch(
            EngineEvent::now(DebateEvent::ContextsReady),
            ContextPatch::prepared_contexts(prepared),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;

    #[tokio::test]
    async fn test_patch_carries_context_per_agent() {
        let ctx = context_with_round(1, 3);
        let outcome = SummarizationNode.execute(&ctx).await.unwrap();

        assert_eq!(outcome.event.event, DebateEvent::ContextsReady);
        let patch = outcome.patch.expect("summarization must patch contexts");
        let contexts = patch.prepared_contexts.unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(contexts.contains_key("a1"));
        assert!(contexts.contains_key("a2"));
    }
}
