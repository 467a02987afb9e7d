//! Notification events for Parley.
//!
//! This crate provides the broadcast bus and the closed set of
//! notification events the engine publishes while a debate runs.
//! Publishing is fire-and-forget: a debate never fails because nobody
//! is listening.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
