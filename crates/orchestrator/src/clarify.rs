//! Concurrent collection of clarifying questions from the agents.

use futures::future::try_join_all;
use std::sync::Arc;

use parley_core::{Agent, AgentClarifications, ClarificationItem};

use crate::error::{OrchestratorError, Result};
use crate::graph::NodeKind;

/// Ask every agent for clarifying questions, concurrently.
///
/// Fail-fast: any agent error aborts the collection. Each agent's list
/// is capped at `max_per_agent`; overflow is dropped with a warning.
/// Questions without an id get their position in the agent's own list.
pub async fn collect_questions(
    problem: &str,
    context: &str,
    agents: &[Arc<dyn Agent>],
    max_per_agent: usize,
    warn: &(dyn Fn(&str) + Send + Sync),
    prior: Option<&[AgentClarifications]>,
) -> Result<Vec<AgentClarifications>> {
    let asks = agents.iter().map(|agent| {
        let agent = Arc::clone(agent);
        async move {
            let questions = agent
                .ask_clarifying_questions(problem, context, prior)
                .await
                .map_err(|err| {
                    OrchestratorError::agent_task(
                        NodeKind::Clarification,
                        &agent.profile().id,
                        err.to_string(),
                    )
                })?;
            Ok::<_, OrchestratorError>((Arc::clone(&agent), questions))
        }
    });

    let mut collected = Vec::with_capacity(agents.len());
    for (agent, mut questions) in try_join_all(asks).await? {
        let profile = agent.profile();
        if questions.len() > max_per_agent {
            warn(&format!(
                "Agent {} asked {} clarifying questions, keeping the first {}",
                profile.id,
                questions.len(),
                max_per_agent
            ));
            questions.truncate(max_per_agent);
        }

        let items = questions
            .into_iter()
            .enumerate()
            .map(|(index, q)| {
                let id = q.id.unwrap_or_else(|| index.to_string());
                ClarificationItem::new(id, q.text)
            })
            .collect();

        collected.push(
            AgentClarifications::new(&profile.id, &profile.name, &profile.role)
                .with_items(items),
        );
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::{
        AgentError, AgentProfile, AgentReply, ClarifyingQuestion, DebateState, PreparedContext,
    };
    use std::result::Result;
    use std::sync::Mutex;

    struct CuriousAgent {
        profile: AgentProfile,
        questions: Vec<ClarifyingQuestion>,
        fail: bool,
    }

    impl CuriousAgent {
        fn new(id: &str, questions: Vec<ClarifyingQuestion>) -> Self {
            Self {
                profile: AgentProfile::new(id, id, "advocate", "test-model"),
                questions,
                fail: false,
            }
        }

        fn failing(id: &str) -> Self {
            let mut agent = Self::new(id, Vec::new());
            agent.fail = true;
            agent
        }
    }

    #[async_trait]
    impl Agent for CuriousAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        async fn propose(
            &self,
            _: &str,
            _: &str,
            _: &DebateState,
        ) -> Result<AgentReply, AgentError> {
            Ok(AgentReply::new("p"))
        }

        async fn critique(
            &self,
            _: &str,
            _: &str,
            _: &DebateState,
        ) -> Result<AgentReply, AgentError> {
            Ok(AgentReply::new("c"))
        }

        async fn refine(
            &self,
            _: &str,
            _: &[String],
            _: &str,
            _: &DebateState,
        ) -> Result<AgentReply, AgentError> {
            Ok(AgentReply::new("r"))
        }

        async fn prepare_context(
            &self,
            context: &str,
            _: u32,
        ) -> Result<PreparedContext, AgentError> {
            Ok(PreparedContext {
                context: context.to_string(),
                summary: None,
            })
        }

        async fn ask_clarifying_questions(
            &self,
            _: &str,
            _: &str,
            _: Option<&[AgentClarifications]>,
        ) -> Result<Vec<ClarifyingQuestion>, AgentError> {
            if self.fail {
                return Err(AgentError::Task("no provider".into()));
            }
            Ok(self.questions.clone())
        }
    }

    fn question(id: Option<&str>, text: &str) -> ClarifyingQuestion {
        ClarifyingQuestion {
            id: id.map(String::from),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_collects_per_agent_with_positional_ids() {
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(CuriousAgent::new(
                "a1",
                vec![question(None, "scope?"), question(Some("custom"), "budget?")],
            )),
            Arc::new(CuriousAgent::new("a2", Vec::new())),
        ];

        let collected = collect_questions("p", "ctx", &agents, 3, &|_| {}, None)
            .await
            .unwrap();

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].items[0].id, "0");
        assert_eq!(collected[0].items[1].id, "custom");
        assert!(collected[1].items.is_empty());
    }

    #[tokio::test]
    async fn test_truncates_overflow_with_one_warning() {
        let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(CuriousAgent::new(
            "a1",
            vec![
                question(None, "q1"),
                question(None, "q2"),
                question(None, "q3"),
                question(None, "q4"),
            ],
        ))];

        let warnings = Mutex::new(Vec::new());
        let collected = collect_questions(
            "p",
            "ctx",
            &agents,
            2,
            &|msg| warnings.lock().unwrap().push(msg.to_string()),
            None,
        )
        .await
        .unwrap();

        assert_eq!(collected[0].items.len(), 2);
        let warnings = warnings.into_inner().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("asked 4"));
    }

    #[tokio::test]
    async fn test_any_failure_aborts() {
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(CuriousAgent::new("a1", vec![question(None, "q")])),
            Arc::new(CuriousAgent::failing("a2")),
        ];

        let result = collect_questions("p", "ctx", &agents, 3, &|_| {}, None).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::AgentTask { .. })
        ));
    }
}
