//! Focus room coordinator.
//!
//! Users join password-gated rooms, share a task board and chat, run one synchronized
//! timer per room, and get focus minutes credited when the owner logs a session.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
