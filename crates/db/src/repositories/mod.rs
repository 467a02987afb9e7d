mod debate_repository;

pub use debate_repository::DebateRepository;
