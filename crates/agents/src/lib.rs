//! LLM-backed debate collaborators.
//!
//! `ChatClient` talks to any OpenAI-compatible chat completions
//! endpoint (OpenRouter, a local proxy, the vendor APIs themselves).
//! `HttpAgent` and `HttpJudge` implement the core capability traits on
//! top of it.

mod client;
mod error;
mod http;
mod prompts;

pub use client::{ChatClient, ChatMessage, ChatOutcome, Role};
pub use error::ClientError;
pub use http::{HttpAgent, HttpJudge};
