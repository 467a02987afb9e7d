use async_trait::async_trait;
use events::Event;
use tracing::info;

use crate::context::NodeContext;
use crate::error::Result;
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Opens the next round, or routes to synthesis when the configured
/// round count is exhausted.
pub struct RoundManagerNode;

#[async_trait]
impl DebateNode for RoundManagerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::RoundManager
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        if ctx.state.current_round >= ctx.config.rounds {
            return Ok(NodeOutcome::event(EngineEvent::now(
                DebateEvent::MaxRoundsReached,
            )));
        }

        let round = ctx.store.begin_round(ctx.state.id).await?;
        info!(debate_id = %ctx.state.id, round, "round started");
        ctx.emit(Event::RoundStarted {
            debate_id: ctx.state.id,
            round,
        });
        Ok(NodeOutcome::event(EngineEvent::now(DebateEvent::BeginRound {
            round,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;

    #[tokio::test]
    async fn test_opens_round_in_store() {
        let mut ctx = context_with_round(0, 3);
        let created = ctx
            .store
            .create_debate("test problem", None, Some(ctx.state.id))
            .await
            .unwrap();
        ctx.state = created;

        let outcome = RoundManagerNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::BeginRound { round: 1 });

        let stored = ctx.store.get_debate(ctx.state.id).await.unwrap().unwrap();
        assert_eq!(stored.current_round, 1);
        assert_eq!(stored.rounds.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_rounds_emit_max() {
        let ctx = context_with_round(3, 3);
        let outcome = RoundManagerNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::MaxRoundsReached);
    }
}
