//! Phase node implementations.

mod clarification;
mod clarification_input;
mod critique;
mod evaluation;
mod initialization;
mod proposal;
mod refinement;
mod round_manager;
mod summarization;
mod synthesis;

pub use clarification::ClarificationNode;
pub use clarification_input::ClarificationInputNode;
pub use critique::CritiqueNode;
pub use evaluation::EvaluationNode;
pub use initialization::InitializationNode;
pub use proposal::ProposalNode;
pub use refinement::RefinementNode;
pub use round_manager::RoundManagerNode;
pub use summarization::SummarizationNode;
pub use synthesis::SynthesisNode;
