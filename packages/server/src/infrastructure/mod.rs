//! Infrastructure layer: in-memory stores, the WebSocket connection registry,
//! password hashing and the wire DTOs.

pub mod connection_registry;
pub mod dto;
pub mod password_hasher;
pub mod repository;
