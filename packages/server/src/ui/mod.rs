//! Focus room HTTP / WebSocket server.

mod error;
mod extract;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use server::Server;
pub use state::AppState;
