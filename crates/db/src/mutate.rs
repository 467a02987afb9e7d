//! State mutations shared by both store implementations.
//!
//! Each function applies one `DebateStore` operation to an in-memory
//! `DebateState` and stamps `updated_at`. The callers hold the
//! per-debate lock and handle load/save.

use chrono::{DateTime, Utc};
use parley_core::{
    AgentClarifications, Contribution, DebateState, DebateStatus, Round, Solution,
};

use crate::error::DbError;

fn touch(state: &mut DebateState) {
    state.updated_at = Utc::now();
}

pub(crate) fn begin_round(state: &mut DebateState) -> u32 {
    state.current_round += 1;
    state.rounds.push(Round::new(state.current_round));
    state.status = DebateStatus::Running;
    touch(state);
    state.current_round
}

pub(crate) fn add_contribution(
    state: &mut DebateState,
    contribution: Contribution,
) -> Result<(), DbError> {
    let id = state.id;
    let round = state
        .active_round_mut()
        .ok_or(DbError::NoActiveRound(id))?;
    round.contributions.push(contribution);
    touch(state);
    Ok(())
}

pub(crate) fn add_summary(
    state: &mut DebateState,
    agent_id: &str,
    summary: &str,
) -> Result<(), DbError> {
    let id = state.id;
    let round = state
        .active_round_mut()
        .ok_or(DbError::NoActiveRound(id))?;
    round
        .summaries
        .get_or_insert_with(Default::default)
        .insert(agent_id.to_string(), summary.to_string());
    touch(state);
    Ok(())
}

pub(crate) fn add_judge_summary(state: &mut DebateState, summary: &str) {
    state.judge_summary = Some(summary.to_string());
    touch(state);
}

pub(crate) fn set_clarifications(state: &mut DebateState, items: Vec<AgentClarifications>) {
    state.clarifications = Some(items);
    touch(state);
}

pub(crate) fn set_clarification_iterations(state: &mut DebateState, iterations: u32) {
    state.clarification_iterations = Some(iterations);
    touch(state);
}

pub(crate) fn set_suspend_state(state: &mut DebateState, node: &str, at: DateTime<Utc>) {
    state.suspended_at_node = Some(node.to_string());
    state.suspended_at = Some(at);
    touch(state);
}

pub(crate) fn clear_suspend_state(state: &mut DebateState) {
    state.suspended_at_node = None;
    state.suspended_at = None;
    touch(state);
}

pub(crate) fn complete_debate(state: &mut DebateState, solution: Solution) {
    state.final_solution = Some(solution);
    state.status = DebateStatus::Completed;
    touch(state);
}

pub(crate) fn fail_debate(state: &mut DebateState, error: &str) {
    state.error = Some(error.to_string());
    state.status = DebateStatus::Failed;
    touch(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{ContributionMetadata, ContributionType};

    fn contribution() -> Contribution {
        Contribution {
            agent_id: "a1".into(),
            agent_role: "analyst".into(),
            kind: ContributionType::Proposal,
            content: "use a bloom filter".into(),
            metadata: ContributionMetadata::new("m"),
            target_agent_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_begin_round_keeps_invariant() {
        let mut state = DebateState::new("p", None);
        assert_eq!(begin_round(&mut state), 1);
        assert_eq!(begin_round(&mut state), 2);
        assert_eq!(state.rounds.len() as u32, state.current_round);
        assert_eq!(state.status, DebateStatus::Running);
    }

    #[test]
    fn test_add_contribution_requires_round() {
        let mut state = DebateState::new("p", None);
        assert!(matches!(
            add_contribution(&mut state, contribution()),
            Err(DbError::NoActiveRound(_))
        ));

        begin_round(&mut state);
        add_contribution(&mut state, contribution()).unwrap();
        assert_eq!(state.rounds[0].contributions.len(), 1);
    }

    #[test]
    fn test_summaries_accumulate_on_active_round() {
        let mut state = DebateState::new("p", None);
        begin_round(&mut state);
        add_summary(&mut state, "a1", "short").unwrap();
        add_summary(&mut state, "a2", "also short").unwrap();
        let summaries = state.rounds[0].summaries.as_ref().unwrap();
        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn test_suspend_round_trip() {
        let mut state = DebateState::new("p", None);
        set_suspend_state(&mut state, "clarification_input", Utc::now());
        assert!(state.is_suspended());
        clear_suspend_state(&mut state);
        assert!(!state.is_suspended());
        assert!(state.suspended_at.is_none());
    }

    #[test]
    fn test_terminal_mutations() {
        let mut state = DebateState::new("p", None);
        complete_debate(&mut state, Solution::new("answer", "judge-model"));
        assert_eq!(state.status, DebateStatus::Completed);
        assert!(state.final_solution.is_some());

        let mut state = DebateState::new("p", None);
        fail_debate(&mut state, "agent exploded");
        assert_eq!(state.status, DebateStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("agent exploded"));
    }
}
