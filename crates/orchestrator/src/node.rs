//! The node contract shared by every debate phase.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::context::NodeContext;
use crate::error::Result;
use crate::events::EngineEvent;
use crate::graph::NodeKind;
use crate::nodes;

/// Typed in-memory changes a node hands back to the execution loop.
///
/// Durable state always goes through the store; a patch only carries
/// ephemeral per-run data that must survive until the next node.
#[derive(Debug, Default, Clone)]
pub struct ContextPatch {
    pub prepared_contexts: Option<HashMap<String, String>>,
}

impl ContextPatch {
    pub fn prepared_contexts(contexts: HashMap<String, String>) -> Self {
        Self {
            prepared_contexts: Some(contexts),
        }
    }

    pub fn apply(self, ctx: &mut NodeContext) {
        if let Some(contexts) = self.prepared_contexts {
            ctx.prepared_contexts = contexts;
        }
    }
}

/// What a node execution produced: exactly one event, plus an
/// optional in-memory patch.
#[derive(Debug)]
pub struct NodeOutcome {
    pub event: EngineEvent,
    pub patch: Option<ContextPatch>,
}

impl NodeOutcome {
    pub fn event(event: EngineEvent) -> Self {
        Self { event, patch: None }
    }

    pub fn with_patch(event: EngineEvent, patch: ContextPatch) -> Self {
        Self {
            event,
            patch: Some(patch),
        }
    }
}

/// A single debate phase.
///
/// Nodes read the world through the context, persist through the
/// store, and report what happened through the returned outcome. They
/// never decide where the debate goes next.
#[async_trait]
pub trait DebateNode: Send + Sync {
    fn kind(&self) -> NodeKind;

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome>;
}

/// Resolves a node kind to its implementation.
///
/// The match is exhaustive, so a kind without a node cannot exist.
pub fn node_for(kind: NodeKind) -> &'static dyn DebateNode {
    match kind {
        NodeKind::Initialization => &nodes::InitializationNode,
        NodeKind::Clarification => &nodes::ClarificationNode,
        NodeKind::ClarificationInput => &nodes::ClarificationInputNode,
        NodeKind::RoundManager => &nodes::RoundManagerNode,
        NodeKind::Summarization => &nodes::SummarizationNode,
        NodeKind::Proposal => &nodes::ProposalNode,
        NodeKind::Critique => &nodes::CritiqueNode,
        NodeKind::Refinement => &nodes::RefinementNode,
        NodeKind::Evaluation => &nodes::EvaluationNode,
        NodeKind::Synthesis => &nodes::SynthesisNode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_resolves_to_its_node() {
        for kind in NodeKind::ALL {
            assert_eq!(node_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_patch_apply_replaces_prepared_contexts() {
        let mut ctx = crate::context::test_support::context_with_round(1, 3);
        ctx.prepared_contexts
            .insert("stale".to_string(), "old".to_string());

        let mut fresh = HashMap::new();
        fresh.insert("a1".to_string(), "summarized".to_string());
        ContextPatch::prepared_contexts(fresh).apply(&mut ctx);

        assert_eq!(ctx.prepared_contexts.get("a1").map(String::as_str), Some("summarized"));
        assert!(!ctx.prepared_contexts.contains_key("stale"));
    }
}
