//! Optional tracing sink for external observability backends.
//!
//! Sink failures are reported by the sink itself and swallowed by the
//! engine: a broken exporter must never alter debate outcomes.

use std::fmt;

/// Error raised by a `TraceSink` implementation.
#[derive(Debug, Clone)]
pub struct TraceError(pub String);

impl TraceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace sink error: {}", self.0)
    }
}

impl std::error::Error for TraceError {}

/// Receives span and generation records from the engine.
///
/// All methods are synchronous and best-effort. The engine invokes
/// them inside a sandbox that logs and discards errors.
pub trait TraceSink: Send + Sync {
    /// A phase node began executing.
    fn span_started(&self, debate_id: &str, node: &str) -> Result<(), TraceError>;

    /// An agent or judge generation finished.
    fn generation_recorded(
        &self,
        debate_id: &str,
        node: &str,
        agent_id: &str,
        model: &str,
        tokens_used: u32,
        latency_ms: u64,
    ) -> Result<(), TraceError>;

    /// A phase node finished, successfully or not.
    fn span_completed(&self, debate_id: &str, node: &str, ok: bool) -> Result<(), TraceError>;
}
