//! The debate transition graph.
//!
//! Pure lookup from (node, event, live context) to the next node. A
//! `None` destination means the loop halts: after `WaitingForInput`
//! that is a suspension, after `Complete` a terminal; the execution
//! loop distinguishes the two by the event that produced the `None`,
//! never by the `None` itself. The graph performs no side effects and
//! never touches persistence.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::NodeContext;
use crate::events::EventKind;

/// The fixed set of phase nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Initialization,
    Clarification,
    ClarificationInput,
    RoundManager,
    Summarization,
    Proposal,
    Critique,
    Refinement,
    Evaluation,
    Synthesis,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        Self::Initialization,
        Self::Clarification,
        Self::ClarificationInput,
        Self::RoundManager,
        Self::Summarization,
        Self::Proposal,
        Self::Critique,
        Self::Refinement,
        Self::Evaluation,
        Self::Synthesis,
    ];

    /// Stable string form, used for the persisted suspend marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Clarification => "clarification",
            Self::ClarificationInput => "clarification_input",
            Self::RoundManager => "round_manager",
            Self::Summarization => "summarization",
            Self::Proposal => "proposal",
            Self::Critique => "critique",
            Self::Refinement => "refinement",
            Self::Evaluation => "evaluation",
            Self::Synthesis => "synthesis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initialization" => Some(Self::Initialization),
            "clarification" => Some(Self::Clarification),
            "clarification_input" => Some(Self::ClarificationInput),
            "round_manager" => Some(Self::RoundManager),
            "summarization" => Some(Self::Summarization),
            "proposal" => Some(Self::Proposal),
            "critique" => Some(Self::Critique),
            "refinement" => Some(Self::Refinement),
            "evaluation" => Some(Self::Evaluation),
            "synthesis" => Some(Self::Synthesis),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional predicate over the live context gating a rule.
pub type Guard = fn(&NodeContext) -> bool;

/// One edge of the transition graph. `to == None` halts the loop.
pub struct TransitionRule {
    pub from: NodeKind,
    pub on: EventKind,
    pub to: Option<NodeKind>,
    pub guard: Option<Guard>,
}

impl TransitionRule {
    const fn edge(from: NodeKind, on: EventKind, to: NodeKind) -> Self {
        Self {
            from,
            on,
            to: Some(to),
            guard: None,
        }
    }

    const fn halt(from: NodeKind, on: EventKind) -> Self {
        Self {
            from,
            on,
            to: None,
            guard: None,
        }
    }

    const fn guarded(from: NodeKind, on: EventKind, to: NodeKind, guard: Guard) -> Self {
        Self {
            from,
            on,
            to: Some(to),
            guard: Some(guard),
        }
    }
}

fn below_round_cap(ctx: &NodeContext) -> bool {
    ctx.state.current_round < ctx.config.rounds
}

/// The transition graph: an ordered rule table.
pub struct TransitionGraph {
    rules: Vec<TransitionRule>,
}

impl TransitionGraph {
    /// The default debate graph.
    pub fn standard() -> Self {
        use EventKind::*;
        use NodeKind::*;

        Self {
            rules: vec![
                TransitionRule::edge(Initialization, Start, Clarification),
                TransitionRule::edge(Clarification, QuestionsPending, ClarificationInput),
                TransitionRule::edge(ClarificationInput, AnswersSubmitted, Clarification),
                // suspend point
                TransitionRule::halt(ClarificationInput, WaitingForInput),
                TransitionRule::edge(Clarification, AllClear, RoundManager),
                TransitionRule::edge(RoundManager, BeginRound, Summarization),
                TransitionRule::edge(Summarization, ContextsReady, Proposal),
                TransitionRule::edge(Proposal, ProposalsComplete, Critique),
                TransitionRule::edge(Critique, CritiquesComplete, Refinement),
                TransitionRule::edge(Refinement, RefinementsComplete, Evaluation),
                TransitionRule::guarded(Evaluation, Continue, RoundManager, below_round_cap),
                TransitionRule::edge(Evaluation, ConsensusReached, Synthesis),
                TransitionRule::edge(Evaluation, MaxRoundsReached, Synthesis),
                TransitionRule::edge(RoundManager, MaxRoundsReached, Synthesis),
                // terminal
                TransitionRule::halt(Synthesis, Complete),
            ],
        }
    }

    /// Destination of the first rule matching (from, on) whose guard
    /// (if any) passes against the live context. `None` when no rule
    /// matches; invalid transitions resolve to `None` like halts do.
    pub fn next_node(
        &self,
        from: NodeKind,
        on: EventKind,
        ctx: &NodeContext,
    ) -> Option<NodeKind> {
        self.rules
            .iter()
            .find(|rule| {
                rule.from == from
                    && rule.on == on
                    && rule.guard.map_or(true, |guard| guard(ctx))
            })
            .and_then(|rule| rule.to)
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;

    #[test]
    fn test_node_kind_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::parse("review"), None);
    }

    #[test]
    fn test_happy_path_edges() {
        let graph = TransitionGraph::standard();
        let ctx = context_with_round(0, 3);

        assert_eq!(
            graph.next_node(NodeKind::Initialization, EventKind::Start, &ctx),
            Some(NodeKind::Clarification)
        );
        assert_eq!(
            graph.next_node(NodeKind::Clarification, EventKind::AllClear, &ctx),
            Some(NodeKind::RoundManager)
        );
        assert_eq!(
            graph.next_node(NodeKind::RoundManager, EventKind::BeginRound, &ctx),
            Some(NodeKind::Summarization)
        );
        assert_eq!(
            graph.next_node(NodeKind::Summarization, EventKind::ContextsReady, &ctx),
            Some(NodeKind::Proposal)
        );
        assert_eq!(
            graph.next_node(NodeKind::Proposal, EventKind::ProposalsComplete, &ctx),
            Some(NodeKind::Critique)
        );
        assert_eq!(
            graph.next_node(NodeKind::Critique, EventKind::CritiquesComplete, &ctx),
            Some(NodeKind::Refinement)
        );
        assert_eq!(
            graph.next_node(NodeKind::Refinement, EventKind::RefinementsComplete, &ctx),
            Some(NodeKind::Evaluation)
        );
    }

    #[test]
    fn test_clarification_cycle() {
        let graph = TransitionGraph::standard();
        let ctx = context_with_round(0, 3);

        assert_eq!(
            graph.next_node(NodeKind::Clarification, EventKind::QuestionsPending, &ctx),
            Some(NodeKind::ClarificationInput)
        );
        assert_eq!(
            graph.next_node(
                NodeKind::ClarificationInput,
                EventKind::AnswersSubmitted,
                &ctx
            ),
            Some(NodeKind::Clarification)
        );
    }

    #[test]
    fn test_suspend_and_terminal_resolve_to_none() {
        let graph = TransitionGraph::standard();
        let ctx = context_with_round(0, 3);

        assert_eq!(
            graph.next_node(NodeKind::ClarificationInput, EventKind::WaitingForInput, &ctx),
            None
        );
        assert_eq!(
            graph.next_node(NodeKind::Synthesis, EventKind::Complete, &ctx),
            None
        );
    }

    #[test]
    fn test_invalid_transition_resolves_to_none() {
        let graph = TransitionGraph::standard();
        let ctx = context_with_round(0, 3);
        assert_eq!(
            graph.next_node(NodeKind::Proposal, EventKind::Start, &ctx),
            None
        );
        assert_eq!(
            graph.next_node(NodeKind::Evaluation, EventKind::Retry, &ctx),
            None
        );
    }

    #[test]
    fn test_continue_guard_respects_round_cap() {
        let graph = TransitionGraph::standard();

        let under_cap = context_with_round(2, 3);
        assert_eq!(
            graph.next_node(NodeKind::Evaluation, EventKind::Continue, &under_cap),
            Some(NodeKind::RoundManager)
        );

        let at_cap = context_with_round(3, 3);
        assert_eq!(
            graph.next_node(NodeKind::Evaluation, EventKind::Continue, &at_cap),
            None
        );
    }

    #[test]
    fn test_both_max_round_entries_reach_synthesis() {
        let graph = TransitionGraph::standard();
        let ctx = context_with_round(3, 3);

        assert_eq!(
            graph.next_node(NodeKind::Evaluation, EventKind::MaxRoundsReached, &ctx),
            Some(NodeKind::Synthesis)
        );
        assert_eq!(
            graph.next_node(NodeKind::RoundManager, EventKind::MaxRoundsReached, &ctx),
            Some(NodeKind::Synthesis)
        );
    }
}
