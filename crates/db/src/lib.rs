//! Persistence for Parley debates.
//!
//! Two `DebateStore` implementations: a sqlite-backed repository (the
//! default for the CLI) and an in-process memory store for tests and
//! dry runs. Both serialize concurrent writes per debate id internally,
//! so the fan-out phases may call them in parallel.

mod error;
mod memory;
pub mod models;
mod mutate;
mod pool;
pub mod repositories;

pub use error::*;
pub use memory::MemoryDebateStore;
pub use models::DebateRow;
pub use pool::*;
pub use repositories::DebateRepository;
