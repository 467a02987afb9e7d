use async_trait::async_trait;

use crate::context::NodeContext;
use crate::error::Result;
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// The suspend point. Checks the persisted clarification groups: any
/// unanswered item keeps the debate waiting for input; a fully
/// answered set hands back to the clarification node for follow-ups.
pub struct ClarificationInputNode;

#[async_trait]
impl DebateNode for ClarificationInputNode {
    fn kind(&self) -> NodeKind {
        NodeKind::ClarificationInput
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let pending: usize = ctx
            .state
            .clarifications
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|g| g.items.iter().filter(|i| !i.is_answered()).count())
            .sum();

        let event = if pending > 0 {
            DebateEvent::WaitingForInput { pending }
        } else {
            DebateEvent::AnswersSubmitted
        };
        Ok(NodeOutcome::event(EngineEvent::now(event)))
    }
}
