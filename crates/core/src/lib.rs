//! Core domain model for Parley.
//!
//! This crate defines the debate data model (states, rounds,
//! contributions, clarifications) and the capability traits of the
//! external collaborators: agents, the judge, and the persistence store.

pub mod collaborators;
pub mod domain;
pub mod store;

pub use collaborators::{
    Agent, AgentError, AgentProfile, AgentReply, ClarifyingQuestion, Judge, PreparedContext,
    ReplyMetadata,
};
pub use domain::{
    AgentClarifications, ClarificationItem, Contribution, ContributionMetadata, ContributionType,
    DebateState, DebateStatus, Round, Solution,
};
pub use store::{DebateStore, StoreError};
