//! Data Transfer Objects (DTOs) for the focus room service.
//!
//! DTOs are organized by protocol:
//! - `websocket`: real-time channel messages (inbound and outbound)
//! - `http`: HTTP API request and response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
