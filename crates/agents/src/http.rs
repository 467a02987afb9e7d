//! `Agent` and `Judge` implementations over the chat client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use parley_core::{
    Agent, AgentClarifications, AgentError, AgentProfile, AgentReply, ClarifyingQuestion,
    DebateState, Judge, PreparedContext, ReplyMetadata, Round, Solution,
};

use crate::client::{ChatClient, ChatMessage, ChatOutcome};
use crate::prompts;

/// Contexts longer than this get condensed by the model before a round.
const SUMMARIZE_THRESHOLD_CHARS: usize = 24_000;

fn reply_from(outcome: ChatOutcome) -> AgentReply {
    AgentReply {
        content: outcome.content,
        metadata: ReplyMetadata {
            model: outcome.model,
            latency_ms: None,
            tokens_used: outcome.tokens_used,
            tool_calls: None,
        },
    }
}

/// One JSON shape agents use for clarifying questions. Models are
/// loose about this, so both bare strings and objects are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionJson {
    Text(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(alias = "question")]
        text: String,
    },
}

impl From<QuestionJson> for ClarifyingQuestion {
    fn from(q: QuestionJson) -> Self {
        match q {
            QuestionJson::Text(text) => ClarifyingQuestion { id: None, text },
            QuestionJson::Object { id, text } => ClarifyingQuestion { id, text },
        }
    }
}

/// Parse a model's clarifying-question output. Accepts a bare JSON
/// array or an array embedded in prose; anything else counts as "no
/// questions" rather than an error.
fn parse_questions(raw: &str) -> Vec<ClarifyingQuestion> {
    if let Ok(questions) = serde_json::from_str::<Vec<QuestionJson>>(raw.trim()) {
        return questions.into_iter().map(Into::into).collect();
    }
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            if let Ok(questions) = serde_json::from_str::<Vec<QuestionJson>>(&raw[start..=end]) {
                return questions.into_iter().map(Into::into).collect();
            }
        }
    }
    debug!("could not parse clarifying questions, treating as none");
    Vec::new()
}

/// First number in the model's output, clamped to the confidence scale.
fn parse_confidence(raw: &str) -> Option<f32> {
    raw.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        .and_then(|t| t.parse::<f32>().ok())
        .map(|v| v.clamp(0.0, 100.0))
}

pub struct HttpAgent {
    profile: AgentProfile,
    client: ChatClient,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl HttpAgent {
    pub fn new(profile: AgentProfile, client: ChatClient) -> Self {
        Self {
            profile,
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    async fn chat(&self, user: String) -> Result<ChatOutcome, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::agent_system(&self.profile.name, &self.profile.role)),
            ChatMessage::user(user),
        ];
        self.client
            .chat(messages, &self.profile.model, self.temperature, self.max_tokens)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl Agent for HttpAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn propose(
        &self,
        problem: &str,
        context: &str,
        _state: &DebateState,
    ) -> Result<AgentReply, AgentError> {
        let outcome = self.chat(prompts::propose(problem, context)).await?;
        Ok(reply_from(outcome))
    }

    async fn critique(
        &self,
        proposal: &str,
        context: &str,
        _state: &DebateState,
    ) -> Result<AgentReply, AgentError> {
        let outcome = self.chat(prompts::critique(proposal, context)).await?;
        Ok(reply_from(outcome))
    }

    async fn refine(
        &self,
        original: &str,
        critiques: &[String],
        context: &str,
        _state: &DebateState,
    ) -> Result<AgentReply, AgentError> {
        let outcome = self
            .chat(prompts::refine(original, critiques, context))
            .await?;
        Ok(reply_from(outcome))
    }

    async fn prepare_context(
        &self,
        context: &str,
        round_number: u32,
    ) -> Result<PreparedContext, AgentError> {
        if context.len() <= SUMMARIZE_THRESHOLD_CHARS {
            return Ok(PreparedContext {
                context: context.to_string(),
                summary: None,
            });
        }

        debug!(
            agent_id = %self.profile.id,
            round_number,
            chars = context.len(),
            "condensing oversized context"
        );
        let outcome = self.chat(prompts::summarize_context(context)).await?;
        Ok(PreparedContext {
            summary: Some(outcome.content.clone()),
            context: outcome.content,
        })
    }

    async fn ask_clarifying_questions(
        &self,
        problem: &str,
        context: &str,
        prior: Option<&[AgentClarifications]>,
    ) -> Result<Vec<ClarifyingQuestion>, AgentError> {
        let outcome = self.chat(prompts::clarify(problem, context, prior)).await?;
        Ok(parse_questions(&outcome.content))
    }
}

pub struct HttpJudge {
    profile: AgentProfile,
    client: ChatClient,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl HttpJudge {
    pub fn new(profile: AgentProfile, client: ChatClient) -> Self {
        Self {
            profile,
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    async fn chat(&self, user: String) -> Result<ChatOutcome, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::judge_system()),
            ChatMessage::user(user),
        ];
        self.client
            .chat(messages, &self.profile.model, self.temperature, self.max_tokens)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl Judge for HttpJudge {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn synthesize(
        &self,
        problem: &str,
        rounds: &[Round],
        context: &str,
    ) -> Result<Solution, AgentError> {
        let context = if context.trim().is_empty() {
            prompts::transcript(rounds)
        } else {
            context.to_string()
        };
        let outcome = self.chat(prompts::synthesize(problem, &context)).await?;
        let model = outcome
            .model
            .clone()
            .unwrap_or_else(|| self.profile.model.clone());
        Ok(Solution::new(outcome.content, model))
    }

    async fn prepare_context(&self, rounds: &[Round]) -> Result<PreparedContext, AgentError> {
        let transcript = prompts::transcript(rounds);
        if transcript.len() <= SUMMARIZE_THRESHOLD_CHARS {
            return Ok(PreparedContext {
                context: transcript,
                summary: None,
            });
        }

        debug!(chars = transcript.len(), "condensing transcript for synthesis");
        let outcome = self.chat(prompts::summarize_context(&transcript)).await?;
        Ok(PreparedContext {
            summary: Some(outcome.content.clone()),
            context: outcome.content,
        })
    }

    async fn evaluate_confidence(&self, state: &DebateState) -> Result<f32, AgentError> {
        let transcript = prompts::transcript(&state.rounds);
        let outcome = self.chat(prompts::evaluate_confidence(&transcript)).await?;

        parse_confidence(&outcome.content).ok_or_else(|| {
            warn!("unparseable confidence reply: {:?}", outcome.content);
            AgentError::Parse(format!(
                "expected a number in [0, 100], got: {}",
                outcome.content
            ))
        })
    }
}
