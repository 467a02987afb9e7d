use std::path::PathBuf;

/// How a debate decides it is done iterating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminationMode {
    /// Run exactly `rounds` rounds.
    FixedRounds,
    /// Stop early once the judge's confidence reaches the threshold
    /// (0-100); `rounds` still caps the iteration count.
    Convergence { threshold: f32 },
}

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 85.0;

impl TerminationMode {
    pub fn convergence() -> Self {
        Self::Convergence {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Run-scoped configuration for one debate.
#[derive(Debug, Clone)]
pub struct DebateConfig {
    /// Maximum number of propose/critique/refine rounds.
    pub rounds: u32,
    /// Whether agents may ask clarifying questions and suspend the
    /// debate waiting for human answers.
    pub interactive_clarifications: bool,
    /// Cap on clarification collection passes.
    pub max_clarification_iterations: u32,
    /// Per-agent cap on clarifying questions per collection pass.
    pub max_questions_per_agent: usize,
    pub termination: TerminationMode,
    /// Include prior-round history in assembled agent contexts.
    pub include_history: bool,
    /// Include answered clarifications in assembled agent contexts.
    pub include_clarifications: bool,
    /// Directory with supporting files, mentioned in assembled contexts.
    pub context_dir: Option<PathBuf>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            interactive_clarifications: false,
            max_clarification_iterations: 3,
            max_questions_per_agent: 3,
            termination: TerminationMode::FixedRounds,
            include_history: true,
            include_clarifications: true,
            context_dir: None,
        }
    }
}

impl DebateConfig {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds,
            ..Default::default()
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_interactive_clarifications(mut self, enabled: bool) -> Self {
        self.interactive_clarifications = enabled;
        self
    }

    pub fn with_max_clarification_iterations(mut self, max: u32) -> Self {
        self.max_clarification_iterations = max;
        self
    }

    pub fn with_termination(mut self, termination: TerminationMode) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_history(mut self, include: bool) -> Self {
        self.include_history = include;
        self
    }

    pub fn with_context_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::default();
        assert_eq!(config.rounds, 3);
        assert!(!config.interactive_clarifications);
        assert_eq!(config.max_clarification_iterations, 3);
        assert_eq!(config.termination, TerminationMode::FixedRounds);
    }

    #[test]
    fn test_builder() {
        let config = DebateConfig::new(5)
            .with_interactive_clarifications(true)
            .with_termination(TerminationMode::convergence())
            .with_history(false);
        assert_eq!(config.rounds, 5);
        assert!(config.interactive_clarifications);
        assert!(!config.include_history);
        assert_eq!(
            config.termination,
            TerminationMode::Convergence {
                threshold: DEFAULT_CONFIDENCE_THRESHOLD
            }
        );
    }
}
