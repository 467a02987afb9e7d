//! Debate orchestration engine.
//!
//! A debate is driven by a persisted, resumable state machine: phase
//! nodes execute one at a time, each emits an engine event, and the
//! transition graph decides the next node. Agent fan-out happens inside
//! nodes; the engine reloads durable state between steps so a process
//! restart can resume a suspended debate from the store alone.

pub mod clarify;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod runner;
pub mod single_pass;
pub mod trace;

pub use config::{DebateConfig, TerminationMode};
pub use context::NodeContext;
pub use error::{OrchestratorError, Result};
pub use events::{DebateEvent, EngineEvent, EventKind};
pub use graph::{NodeKind, TransitionGraph, TransitionRule};
pub use node::{ContextPatch, DebateNode, NodeOutcome};
pub use runner::{DebateOrchestrator, ExecutionResult, RunMetadata, SuspendReason, SuspendedPayload};
pub use single_pass::SinglePassOrchestrator;
pub use trace::{TraceError, TraceSink};
