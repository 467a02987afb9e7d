use serde::{Deserialize, Serialize};

/// One clarifying question and its (possibly pending) answer.
///
/// An empty or whitespace answer means "not yet answered". The literal
/// string "NA" is an answer: the human explicitly declined the question,
/// and it must not keep the debate suspended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClarificationItem {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl ClarificationItem {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: String::new(),
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = answer.into();
        self
    }

    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// All clarifying questions asked by one agent across a debate.
///
/// Item ids are unique within a debate; follow-up rounds namespace new
/// ids as `f<round>-<index>` so they never collide with originals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentClarifications {
    pub agent_id: String,
    pub agent_name: String,
    pub role: String,
    pub items: Vec<ClarificationItem>,
}

impl AgentClarifications {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            role: role.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<ClarificationItem>) -> Self {
        self.items = items;
        self
    }

    pub fn has_unanswered(&self) -> bool {
        self.items.iter().any(|item| !item.is_answered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answered_states() {
        assert!(!ClarificationItem::new("q1", "scope?").is_answered());
        assert!(!ClarificationItem::new("q1", "scope?")
            .with_answer("   ")
            .is_answered());
        assert!(ClarificationItem::new("q1", "scope?")
            .with_answer("EU only")
            .is_answered());
        // "NA" is an explicit decline, which counts as answered.
        assert!(ClarificationItem::new("q1", "scope?")
            .with_answer("NA")
            .is_answered());
    }

    #[test]
    fn test_group_unanswered() {
        let group = AgentClarifications::new("a1", "Analyst", "analyst").with_items(vec![
            ClarificationItem::new("q1", "first?").with_answer("yes"),
            ClarificationItem::new("q2", "second?"),
        ]);
        assert!(group.has_unanswered());

        let done = AgentClarifications::new("a1", "Analyst", "analyst").with_items(vec![
            ClarificationItem::new("q1", "first?").with_answer("yes"),
            ClarificationItem::new("q2", "second?").with_answer("NA"),
        ]);
        assert!(!done.has_unanswered());
    }
}
