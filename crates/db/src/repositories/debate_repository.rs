use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{
    AgentClarifications, Contribution, DebateState, DebateStore, Solution, StoreError,
};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::DebateRow;
use crate::mutate;

/// Sqlite-backed debate store.
///
/// The whole debate state is one JSON column, mutated under a
/// per-debate-id lock, so the fan-out phases can issue writes for the
/// same debate concurrently without interleaving lost updates.
#[derive(Clone)]
pub struct DebateRepository {
    pool: SqlitePool,
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl DebateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Drop a terminal debate's lock entry; in-flight holders keep
    /// their `Arc` clone, and a late write simply recreates the entry.
    async fn release_lock(&self, id: Uuid) {
        self.locks.lock().await.remove(&id);
    }

    async fn load(&self, id: Uuid) -> Result<DebateState, DbError> {
        self.find(id).await?.ok_or(DbError::DebateNotFound(id))
    }

    async fn find(&self, id: Uuid) -> Result<Option<DebateState>, DbError> {
        let row: Option<DebateRow> = sqlx::query_as(
            r#"
            SELECT id, status, state, created_at, updated_at
            FROM debates
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DebateRow::into_domain).transpose()
    }

    async fn save(&self, state: &DebateState) -> Result<(), DbError> {
        let row = DebateRow::try_from(state)?;
        sqlx::query(
            r#"
            UPDATE debates
            SET status = ?, state = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.status)
        .bind(&row.state)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load, mutate, and save under the debate's write lock.
    async fn with_state<R, F>(&self, id: Uuid, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut DebateState) -> Result<R, DbError>,
    {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut state = self.load(id).await?;
        let out = f(&mut state)?;
        self.save(&state).await?;
        Ok(out)
    }
}

#[async_trait]
impl DebateStore for DebateRepository {
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
        let row = DebateRow::try_from(&state).map_err(StoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO debates (id, status, state, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.status)
        .bind(&row.state)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(state)
    }

    async fn get_debate(&self, id: Uuid) -> Result<Option<DebateState>, StoreError> {
        Ok(self.find(id).await?)
    }

    async fn begin_round(&self, id: Uuid) -> Result<u32, StoreError> {
        Ok(self.with_state(id, |s| Ok(mutate::begin_round(s))).await?)
    }

    async fn add_contribution(
        &self,
        id: Uuid,
        contribution: Contribution,
    ) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| mutate::add_contribution(s, contribution))
            .await?)
    }

    async fn add_summary(&self, id: Uuid, agent_id: &str, summary: &str)
        -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| mutate::add_summary(s, agent_id, summary))
            .await?)
    }

    async fn add_judge_summary(&self, id: Uuid, summary: &str) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| {
                mutate::add_judge_summary(s, summary);
                Ok(())
            })
            .await?)
    }

    async fn set_clarifications(
        &self,
        id: Uuid,
        items: Vec<AgentClarifications>,
    ) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| {
                mutate::set_clarifications(s, items);
                Ok(())
            })
            .await?)
    }

    async fn set_clarification_iterations(
        &self,
        id: Uuid,
        iterations: u32,
    ) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| {
                mutate::set_clarification_iterations(s, iterations);
                Ok(())
            })
            .await?)
    }

    async fn set_suspend_state(
        &self,
        id: Uuid,
        node: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| {
                mutate::set_suspend_state(s, node, at);
                Ok(())
            })
            .await?)
    }

    async fn clear_suspend_state(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(self
            .with_state(id, |s| {
                mutate::clear_suspend_state(s);
                Ok(())
            })
            .await?)
    }

    async fn complete_debate(&self, id: Uuid, solution: Solution) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::complete_debate(s, solution);
            Ok(())
        })
        .await?;
        self.release_lock(id).await;
        Ok(())
    }

    async fn fail_debate(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.with_state(id, |s| {
            mutate::fail_debate(s, error);
            Ok(())
        })
        .await?;
        self.release_lock(id).await;
        Ok(())
    }

    async fn list_debates(&self) -> Result<Vec<DebateState>, StoreError> {
        let rows: Vec<DebateRow> = sqlx::query_as(
            r#"
            SELECT id, status, state, created_at, updated_at
            FROM debates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use parley_core::{ContributionMetadata, ContributionType, DebateStatus};

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn contribution(agent: &str) -> Contribution {
        Contribution {
            agent_id: agent.to_string(),
            agent_role: "analyst".to_string(),
            kind: ContributionType::Proposal,
            content: "proposal text".to_string(),
            metadata: ContributionMetadata::new("test-model").with_latency(10),
            target_agent_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_debate() {
        let repo = DebateRepository::new(setup_test_db().await);

        let created = repo
            .create_debate("should we shard?", Some("10M rows"), None)
            .await
            .unwrap();
        assert_eq!(created.status, DebateStatus::Pending);

        let found = repo.get_debate(created.id).await.unwrap().unwrap();
        assert_eq!(found.problem, "should we shard?");
        assert_eq!(found.context.as_deref(), Some("10M rows"));
    }

    #[tokio::test]
    async fn test_create_with_explicit_id() {
        let repo = DebateRepository::new(setup_test_db().await);
        let id = Uuid::new_v4();

        let created = repo.create_debate("p", None, Some(id)).await.unwrap();
        assert_eq!(created.id, id);
        assert!(repo.get_debate(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_round_and_contributions() {
        let repo = DebateRepository::new(setup_test_db().await);
        let debate = repo.create_debate("p", None, None).await.unwrap();

        assert_eq!(repo.begin_round(debate.id).await.unwrap(), 1);
        repo.add_contribution(debate.id, contribution("a1"))
            .await
            .unwrap();
        repo.add_contribution(debate.id, contribution("a2"))
            .await
            .unwrap();
        repo.add_summary(debate.id, "a1", "compressed").await.unwrap();

        let state = repo.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(state.status, DebateStatus::Running);
        assert_eq!(state.current_round, 1);
        assert_eq!(state.rounds[0].contributions.len(), 2);
        assert_eq!(
            state.rounds[0].summaries.as_ref().unwrap()["a1"],
            "compressed"
        );
    }

    #[tokio::test]
    async fn test_suspend_and_clear() {
        let repo = DebateRepository::new(setup_test_db().await);
        let debate = repo.create_debate("p", None, None).await.unwrap();

        repo.set_suspend_state(debate.id, "clarification_input", Utc::now())
            .await
            .unwrap();
        let state = repo.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(
            state.suspended_at_node.as_deref(),
            Some("clarification_input")
        );

        repo.clear_suspend_state(debate.id).await.unwrap();
        let state = repo.get_debate(debate.id).await.unwrap().unwrap();
        assert!(!state.is_suspended());
    }

    #[tokio::test]
    async fn test_complete_and_fail() {
        let repo = DebateRepository::new(setup_test_db().await);

        let debate = repo.create_debate("p", None, None).await.unwrap();
        repo.complete_debate(debate.id, Solution::new("final", "judge"))
            .await
            .unwrap();
        let state = repo.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(state.status, DebateStatus::Completed);
        assert_eq!(state.final_solution.unwrap().content, "final");

        let debate = repo.create_debate("p2", None, None).await.unwrap();
        repo.fail_debate(debate.id, "provider 500").await.unwrap();
        let state = repo.get_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(state.status, DebateStatus::Failed);
    }

    #[tokio::test]
    async fn test_terminal_debates_release_their_locks() {
        let repo = DebateRepository::new(setup_test_db().await);

        let debate = repo.create_debate("p", None, None).await.unwrap();
        repo.begin_round(debate.id).await.unwrap();
        assert_eq!(repo.locks.lock().await.len(), 1);

        repo.complete_debate(debate.id, Solution::new("final", "judge"))
            .await
            .unwrap();
        assert!(repo.locks.lock().await.is_empty());

        let debate = repo.create_debate("p2", None, None).await.unwrap();
        repo.begin_round(debate.id).await.unwrap();
        repo.fail_debate(debate.id, "provider 500").await.unwrap();
        assert!(repo.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_debates() {
        let repo = DebateRepository::new(setup_test_db().await);
        repo.create_debate("first", None, None).await.unwrap();
        repo.create_debate("second", None, None).await.unwrap();

        let all = repo.list_debates().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_debate_is_not_found() {
        let repo = DebateRepository::new(setup_test_db().await);
        let err = repo.begin_round(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
