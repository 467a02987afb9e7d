mod clarification;
mod contribution;
mod debate;

pub use clarification::{AgentClarifications, ClarificationItem};
pub use contribution::{Contribution, ContributionMetadata, ContributionType};
pub use debate::{DebateState, DebateStatus, Round, Solution};
