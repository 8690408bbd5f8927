//! Repository 実装
//!
//! - `inmemory`: HashMap をドキュメントストアとして使う実装

pub mod inmemory;

pub use inmemory::{InMemoryRoomRepository, InMemoryUserStatsRepository};
