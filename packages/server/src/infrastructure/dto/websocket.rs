//! WebSocket message DTOs.
//!
//! Every message is a JSON object with a `type` discriminator. Field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::InboundMessage;

use super::http::{ChatMessageDto, RoomTaskDto};

/// Server → client events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomUpdate {
        trigger: String,
    },
    MemberApproved {
        user_id: String,
        room_name: String,
    },
    NewTask {
        task: RoomTaskDto,
    },
    TaskUpdated {
        task_id: String,
        updates: TaskUpdatesDto,
    },
    TimerUpdate {
        status: String,
        start_time: Option<String>,
        duration: u32,
    },
    ChatMessage(ChatMessageDto),
    UserJoined {
        user_id: String,
        connected_at: String,
    },
    UserLeft {
        user_id: String,
    },
}

/// Only the fields that actually changed are serialized
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatesDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

/// Client → server messages the server understands
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
enum KnownClientMessage {
    ChatMessage {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        user_name: Option<String>,
        content: String,
    },
    TimerStart {
        #[serde(default)]
        duration: Option<u32>,
    },
}

#[derive(Debug, Error)]
pub enum ClientMessageError {
    #[error("message is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("message has no string `type` field")]
    MissingType,
    #[error("invalid `{kind}` message: {source}")]
    InvalidFields {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a text frame into an inbound message.
///
/// Known types are validated; any other `type` is kept verbatim as
/// [`InboundMessage::Unknown`].
pub fn parse_client_message(text: &str) -> Result<InboundMessage, ClientMessageError> {
    let value: Value = serde_json::from_str(text).map_err(ClientMessageError::InvalidJson)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ClientMessageError::MissingType)?
        .to_string();

    match kind.as_str() {
        "chat_message" | "timer_start" => {
            let known = serde_json::from_value::<KnownClientMessage>(value)
                .map_err(|source| ClientMessageError::InvalidFields { kind, source })?;
            Ok(known.into_inbound())
        }
        _ => Ok(InboundMessage::Unknown(value)),
    }
}

impl KnownClientMessage {
    fn into_inbound(self) -> InboundMessage {
        match self {
            KnownClientMessage::ChatMessage {
                id,
                user_name,
                content,
            } => InboundMessage::Chat {
                id,
                user_name,
                content,
            },
            KnownClientMessage::TimerStart { duration } => InboundMessage::TimerStart {
                duration_minutes: duration,
            },
        }
    }
}
