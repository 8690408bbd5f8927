//! Utilities shared by the focus room binaries.

pub mod logger;
pub mod time;
