use async_trait::async_trait;
use events::Event;
use tracing::info;

use crate::config::TerminationMode;
use crate::context::NodeContext;
use crate::error::{OrchestratorError, Result};
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// End-of-round decision: another round, early consensus, or the
/// round cap.
pub struct EvaluationNode;

#[async_trait]
impl DebateNode for EvaluationNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Evaluation
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let at_cap = ctx.state.current_round >= ctx.config.rounds;

        let event = match ctx.config.termination {
            TerminationMode::FixedRounds => {
                if at_cap {
                    DebateEvent::MaxRoundsReached
                } else {
                    DebateEvent::Continue
                }
            }
            TerminationMode::Convergence { threshold } => {
                let confidence = ctx
                    .judge
                    .evaluate_confidence(&ctx.state)
                    .await
                    .map_err(|err| OrchestratorError::judge_task(NodeKind::Evaluation, err))?;
                info!(
                    debate_id = %ctx.state.id,
                    round = ctx.state.current_round,
                    confidence,
                    threshold,
                    "consensus evaluated"
                );
                ctx.emit(Event::ConsensusEvaluated {
                    debate_id: ctx.state.id,
                    round: ctx.state.current_round,
                    confidence,
                    threshold,
                });

                if confidence >= threshold {
                    DebateEvent::ConsensusReached { confidence }
                } else if at_cap {
                    DebateEvent::MaxRoundsReached
                } else {
                    DebateEvent::Continue
                }
            }
        };

        Ok(NodeOutcome::event(EngineEvent::now(event)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;

    #[tokio::test]
    async fn test_fixed_rounds_continues_under_cap() {
        let ctx = context_with_round(1, 3);
        let outcome = EvaluationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::Continue);
    }

    #[tokio::test]
    async fn test_fixed_rounds_stops_at_cap() {
        let ctx = context_with_round(3, 3);
        let outcome = EvaluationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::MaxRoundsReached);
    }

    #[tokio::test]
    async fn test_convergence_below_threshold_continues() {
        // NullJudge reports zero confidence.
        let mut ctx = context_with_round(1, 3);
        ctx.config.termination = TerminationMode::Convergence { threshold: 85.0 };
        let outcome = EvaluationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::Continue);
    }

    #[tokio::test]
    async fn test_convergence_below_threshold_at_cap_stops() {
        let mut ctx = context_with_round(3, 3);
        ctx.config.termination = TerminationMode::Convergence { threshold: 85.0 };
        let outcome = EvaluationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::MaxRoundsReached);
    }
}
