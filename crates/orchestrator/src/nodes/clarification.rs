use async_trait::async_trait;
use parley_core::{Agent, AgentClarifications, ClarificationItem};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::clarify::collect_questions;
use crate::context::NodeContext;
use crate::error::Result;
use crate::events::{DebateEvent, EngineEvent};
use crate::graph::NodeKind;
use crate::node::{DebateNode, NodeOutcome};

/// Collects clarifying questions and decides whether the debate needs
/// human input before the first round.
///
/// Emits `AllClear` when interactive clarifications are disabled, the
/// iteration cap is hit, or nothing is left to answer after a
/// collection cycle. Otherwise persists the merged question set, bumps
/// the iteration counter, and emits `QuestionsPending`.
///
/// Two collection cycles exist. While unanswered items remain (or no
/// questions were ever gathered), the agents still pending are polled
/// without prior context. Once every item is answered, all agents are
/// re-polled with the answered set so they can ask follow-ups; those
/// get `f<iteration>-<index>` ids so they never shadow earlier items.
pub struct ClarificationNode;

#[async_trait]
impl DebateNode for ClarificationNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Clarification
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutcome> {
        let iterations = ctx.state.clarification_iterations.unwrap_or(0);
        if !ctx.config.interactive_clarifications
            || iterations >= ctx.config.max_clarification_iterations
        {
            return Ok(NodeOutcome::event(EngineEvent::now(DebateEvent::AllClear)));
        }

        let existing = ctx.state.clarifications.clone().unwrap_or_default();
        let follow_up = !existing.is_empty() && unanswered_count(&existing) == 0;

        let targets: Vec<Arc<dyn Agent>> = if follow_up || existing.is_empty() {
            ctx.agents.clone()
        } else {
            ctx.agents
                .iter()
                .filter(|a| is_pending(a.profile().id.as_str(), &existing))
                .cloned()
                .collect()
        };
        let polled: HashSet<String> =
            targets.iter().map(|a| a.profile().id.clone()).collect();

        let prior = if existing.is_empty() {
            None
        } else {
            Some(existing.as_slice())
        };
        let base = ctx.base_context();
        let mut collected = collect_questions(
            &ctx.state.problem,
            &base,
            &targets,
            ctx.config.max_questions_per_agent,
            &|msg| ctx.warn(msg),
            prior,
        )
        .await?;

        if follow_up {
            assign_follow_up_ids(&mut collected, iterations + 1);
        }

        let merged = merge(existing, collected, iterations + 1, &polled);
        let pending = unanswered_count(&merged);
        if pending == 0 {
            debug!(debate_id = %ctx.state.id, "no clarifying questions pending");
            return Ok(NodeOutcome::event(EngineEvent::now(DebateEvent::AllClear)));
        }

        ctx.store.set_clarifications(ctx.state.id, merged).await?;
        ctx.store
            .set_clarification_iterations(ctx.state.id, iterations + 1)
            .await?;

        Ok(NodeOutcome::event(EngineEvent::now(
            DebateEvent::QuestionsPending { pending },
        )))
    }
}

fn unanswered_count(groups: &[AgentClarifications]) -> usize {
    groups
        .iter()
        .map(|g| g.items.iter().filter(|i| !i.is_answered()).count())
        .sum()
}

fn is_pending(agent_id: &str, groups: &[AgentClarifications]) -> bool {
    match groups.iter().find(|g| g.agent_id == agent_id) {
        Some(group) => group.items.iter().any(|i| !i.is_answered()),
        None => true,
    }
}

/// Replace follow-up question ids with `f<iteration>-<index>`, the
/// index running globally across agents within one collection cycle.
fn assign_follow_up_ids(collected: &mut [AgentClarifications], iteration: u32) {
    let mut index = 0usize;
    for group in collected {
        for item in &mut group.items {
            item.id = format!("f{iteration}-{index}");
            index += 1;
        }
    }
}

/// Union the freshly collected questions into the existing groups.
///
/// Existing items and their answers are never overwritten. A collected
/// item is appended when neither its id nor its question text matches
/// an existing item of the same agent; an id collision is resolved by
/// renaming to `f<iteration>-<index>`. Collected groups without items
/// are discarded, and a prior group whose agent was polled and came
/// back empty-handed with every item answered is dropped: that agent
/// is done asking.
fn merge(
    existing: Vec<AgentClarifications>,
    collected: Vec<AgentClarifications>,
    iteration: u32,
    polled: &HashSet<String>,
) -> Vec<AgentClarifications> {
    let mut merged = existing;
    let mut follow_up_index = 0usize;
    let mut heard_from: HashSet<String> = HashSet::new();

    for group in collected {
        if group.items.is_empty() {
            continue;
        }
        heard_from.insert(group.agent_id.clone());

        let slot = match merged.iter_mut().find(|g| g.agent_id == group.agent_id) {
            Some(slot) => slot,
            None => {
                merged.push(AgentClarifications::new(
                    &group.agent_id,
                    &group.agent_name,
                    &group.role,
                ));
                merged.last_mut().unwrap()
            }
        };

        for item in group.items {
            if slot.items.iter().any(|i| i.question == item.question) {
                continue;
            }
            let id_taken = slot.items.iter().any(|i| i.id == item.id);

            let id = if id_taken {
                let id = format!("f{iteration}-{follow_up_index}");
                follow_up_index += 1;
                id
            } else {
                item.id
            };
            slot.items.push(ClarificationItem::new(id, item.question));
        }
    }

    merged.retain(|group| {
        heard_from.contains(&group.agent_id)
            || !polled.contains(&group.agent_id)
            || group.items.iter().any(|i| !i.is_answered())
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_with_round;

    fn group(agent_id: &str, items: Vec<ClarificationItem>) -> AgentClarifications {
        AgentClarifications::new(agent_id, agent_id, "advocate").with_items(items)
    }

    fn polled(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_clear_when_not_interactive() {
        let ctx = context_with_round(0, 3);
        assert!(!ctx.config.interactive_clarifications);

        let outcome = ClarificationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::AllClear);
    }

    #[tokio::test]
    async fn test_all_clear_at_iteration_cap() {
        let mut ctx = context_with_round(0, 3);
        ctx.config.interactive_clarifications = true;
        ctx.config.max_clarification_iterations = 2;
        ctx.state.clarification_iterations = Some(2);
        // A pending item must not keep the debate suspended past the cap.
        ctx.state.clarifications = Some(vec![group(
            "a1",
            vec![ClarificationItem::new("0", "still open?")],
        )]);

        let outcome = ClarificationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::AllClear);
    }

    #[tokio::test]
    async fn test_pending_items_repoll_agents_and_route_to_input() {
        // NullAgent asks nothing, so the seeded question stays the only
        // pending one; the cycle still counts as a collection pass.
        let mut ctx = context_with_round(0, 3);
        ctx.config.interactive_clarifications = true;
        ctx.store
            .create_debate("test problem", None, Some(ctx.state.id))
            .await
            .unwrap();
        ctx.state.clarifications = Some(vec![group(
            "a1",
            vec![
                ClarificationItem::new("0", "scope?").with_answer("EU"),
                ClarificationItem::new("1", "budget?"),
            ],
        )]);

        let outcome = ClarificationNode.execute(&ctx).await.unwrap();
        assert_eq!(
            outcome.event.event,
            DebateEvent::QuestionsPending { pending: 1 }
        );

        let stored = ctx.store.get_debate(ctx.state.id).await.unwrap().unwrap();
        assert_eq!(stored.clarification_iterations, Some(1));
        assert_eq!(stored.clarifications.unwrap()[0].items.len(), 2);
    }

    #[tokio::test]
    async fn test_all_clear_when_agents_ask_nothing() {
        // NullAgent asks no questions.
        let mut ctx = context_with_round(0, 3);
        ctx.config.interactive_clarifications = true;

        let outcome = ClarificationNode.execute(&ctx).await.unwrap();
        assert_eq!(outcome.event.event, DebateEvent::AllClear);
    }

    #[test]
    fn test_merge_preserves_existing_answers() {
        let existing = vec![group(
            "a1",
            vec![ClarificationItem::new("0", "scope?").with_answer("EU")],
        )];
        let collected = vec![group(
            "a1",
            vec![
                ClarificationItem::new("0", "scope?"),
                ClarificationItem::new("1", "budget?"),
            ],
        )];

        let merged = merge(existing, collected, 1, &polled(&["a1"]));
        assert_eq!(merged[0].items.len(), 2);
        assert_eq!(merged[0].items[0].answer, "EU");
        assert_eq!(merged[0].items[1].id, "1");
    }

    #[test]
    fn test_merge_renames_colliding_follow_ups() {
        let existing = vec![group(
            "a1",
            vec![ClarificationItem::new("0", "scope?").with_answer("EU")],
        )];
        // Positional id "0" collides with the original question.
        let collected = vec![group("a1", vec![ClarificationItem::new("0", "latency target?")])];

        let merged = merge(existing, collected, 2, &polled(&["a1"]));
        assert_eq!(merged[0].items.len(), 2);
        assert_eq!(merged[0].items[1].id, "f2-0");
        assert_eq!(merged[0].items[1].question, "latency target?");
    }

    #[test]
    fn test_merge_adds_group_for_new_agent() {
        let existing = vec![group(
            "a1",
            vec![ClarificationItem::new("0", "scope?").with_answer("EU")],
        )];
        let collected = vec![group("a2", vec![ClarificationItem::new("0", "deadline?")])];

        let merged = merge(existing, collected, 1, &polled(&["a1", "a2"]));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].agent_id, "a2");
    }

    #[test]
    fn test_merge_skips_empty_incoming_groups() {
        let collected = vec![
            group("a1", Vec::new()),
            group("a2", vec![ClarificationItem::new("0", "deadline?")]),
        ];

        let merged = merge(Vec::new(), collected, 1, &polled(&["a1", "a2"]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].agent_id, "a2");
    }

    #[test]
    fn test_merge_drops_answered_group_when_agent_stops_asking() {
        let existing = vec![
            group(
                "a1",
                vec![ClarificationItem::new("0", "scope?").with_answer("EU")],
            ),
            group("a2", vec![ClarificationItem::new("0", "deadline?")]),
        ];

        // Both agents were polled and came back with nothing: the fully
        // answered group goes away, the still-pending one stays.
        let merged = merge(existing, Vec::new(), 2, &polled(&["a1", "a2"]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].agent_id, "a2");
    }

    #[test]
    fn test_merge_keeps_answered_group_of_unpolled_agent() {
        let existing = vec![group(
            "a1",
            vec![ClarificationItem::new("0", "scope?").with_answer("EU")],
        )];

        let merged = merge(existing, Vec::new(), 2, &polled(&["a2"]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].items[0].answer, "EU");
    }

    #[test]
    fn test_follow_up_ids_run_globally_across_agents() {
        let mut collected = vec![
            group(
                "a1",
                vec![
                    ClarificationItem::new("0", "latency target?"),
                    ClarificationItem::new("1", "error budget?"),
                ],
            ),
            group("a2", vec![ClarificationItem::new("0", "deadline?")]),
        ];

        assign_follow_up_ids(&mut collected, 2);
        assert_eq!(collected[0].items[0].id, "f2-0");
        assert_eq!(collected[0].items[1].id, "f2-1");
        assert_eq!(collected[1].items[0].id, "f2-2");
    }
}
