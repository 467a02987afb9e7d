use async_trait::async_trait;
use events::Event;
use tracing::info;

use crate::context::NodeContext;
use crate::error::Result;
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Entry node. The debate row already exists; this announces the run.
pub struct InitializationNode;

#[async_trait]
impl DebateNode for InitializationNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Initialization
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        info!(
            debate_id = %ctx.state.id,
            agents = ctx.agents.len(),
            rounds = ctx.config.rounds,
            "starting debate"
        );
        ctx.emit(Event::DebateStarted {
            debate_id: ctx.state.id,
            problem: ctx.state.problem.clone(),
        });
        Ok(NodeOutcome::event(EngineEvent::now(DebateEvent::Start)))
    }
}
