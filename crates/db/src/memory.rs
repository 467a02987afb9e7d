//! In-process debate store for tests and dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{
    AgentClarifications, Contribution, DebateState, DebateStore, Solution, StoreError,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::DbError;
use crate::mutate;

/// A `DebateStore` holding all debates in memory. One mutex guards the
/// whole map, which trivially serializes concurrent writes per debate.
#[derive(Clone, Default)]
pub struct MemoryDebateStore {
    debates: Arc<Mutex<HashMap<Uuid, DebateState>>>,
}

impl MemoryDebateStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_state<R, F>(&self, id: Uuid, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut DebateState) -> Result<R, DbError>,
    {
        let mut debates = self.debates.lock().await;
        let state = debates.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        f(state).map_err(StoreError::from)
    }
}

#[async_trait]
impl DebateStore for MemoryDebateStore {
    async fn create_debate(
        &self,
        problem: &str,
        context: Option<&str>,
        id: Option<Uuid>,
    ) -> Result<DebateState, StoreError> {
        let mut state = DebateState::new(problem, context.map(String::from));
        if let Some(id) = id {
            state = state.with_id(id);
        }
        self.debates.lock().await.insert(state.id, state.clone());
        Ok(state)
    }

    async fn get_debate(&self, id: Uuid) -> Result<Option<DebateState>, StoreError> {
        Ok(self.debates.lock().await.get(&id).cloned())
    }

    async fn begin_round(&self, id: Uuid) -> Result<u32, StoreError> {
        self.with_state(id, |s| Ok(mutate::begin_round(s))).await
    }

    async fn add_contribution(
        &self,
        id: Uuid,
        contribution: Contribution,
    ) -> Result<(), StoreError> {
        self.with_state(id, |s| mutate::add_contribution(s, contribution))
            .await
    }

    async fn add_summary(&self, id: Uuid, agent_id: &str, summary: &str)
        -> Result<(), StoreError> {
        self.with_state(id, |s| mutate::add_summary(s, agent_id, summary))
            .await
    }

    async fn add_judge_summary(&self, id: Uuid, summary: &str) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::add_judge_summary(s, summary);
            Ok(())
        })
        .await
    }

    async fn set_clarifications(
        &self,
        id: Uuid,
        items: Vec<AgentClarifications>,
    ) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::set_clarifications(s, items);
            Ok(())
        })
        .await
    }

    async fn set_clarification_iterations(
        &self,
        id: Uuid,
        iterations: u32,
    ) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::set_clarification_iterations(s, iterations);
            Ok(())
        })
        .await
    }

    async fn set_suspend_state(
        &self,
        id: Uuid,
        node: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::set_suspend_state(s, node, at);
            Ok(())
        })
        .await
    }

    async fn clear_suspend_state(&self, id: Uuid) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::clear_suspend_state(s);
            Ok(())
        })
        .await
    }

    async fn complete_debate(&self, id: Uuid, solution: Solution) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::complete_debate(s, solution);
            Ok(())
        })
        .await
    }

    async fn fail_debate(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::fail_debate(s, error);
            Ok(())
        })
        .await
    }

    async fn list_debates(&self) -> Result<Vec<DebateState>, StoreError> {
        let debates = self.debates.lock().await;
        let mut all: Vec<DebateState> = debates.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{ContributionMetadata, ContributionType, DebateStatus};

    fn contribution(agent: &str) -> Contribution {
        Contribution {
            agent_id: agent.to_string(),
            agent_role: "analyst".to_string(),
            kind: ContributionType::Proposal,
            content: "c".to_string(),
            metadata: ContributionMetadata::new("m"),
            target_agent_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic_flow() {
        let store = MemoryDebateStore::new();
        let debate = store.create_debate("p", None, None).await.unwrap();

        store.begin_round(debate.id).await.unwrap();
        store
            .add_contribution(debate.id, contribution("a1"))
            .await
            .unwrap();
        store
            .complete_debate(debate.id, Solution::new("done", "judge"))
            .await
            .unwrap();

        let state = store.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(state.status, DebateStatus::Completed);
        assert_eq!(state.rounds[0].contributions.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_contributions_all_persisted() {
        let store = MemoryDebateStore::new();
        let debate = store.create_debate("p", None, None).await.unwrap();
        store.begin_round(debate.id).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let id = debate.id;
            tasks.push(tokio::spawn(async move {
                store
                    .add_contribution(id, contribution(&format!("a{i}")))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let state = store.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(state.rounds[0].contributions.len(), 8);
    }

    #[tokio::test]
    async fn test_unknown_id_errors() {
        let store = MemoryDebateStore::new();
        assert!(matches!(
            store.begin_round(Uuid::new_v4()).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
