//! ルーム内イベント
//!
//! `RoomEvent` はサーバーからルームの全接続へ配信されるイベント、
//! `InboundMessage` はクライアントからリアルタイムチャネルで届くメッセージです。
//! 未知の type のメッセージは `Unknown` として生の JSON のまま保持し、そのまま転送します。

use serde_json::Value;

use super::{
    entity::{ChatMessage, RoomTask, TaskPatch},
    timer::TimerState,
    value_object::{RoomName, TaskId, Timestamp, UserId},
};

/// `room_update` の発生理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomUpdateTrigger {
    NewJoinRequest,
    MemberApproved,
}

impl RoomUpdateTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomUpdateTrigger::NewJoinRequest => "new_join_request",
            RoomUpdateTrigger::MemberApproved => "member_approved",
        }
    }
}

/// サーバーからルームへ配信するイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    RoomUpdate {
        trigger: RoomUpdateTrigger,
    },
    MemberApproved {
        user_id: UserId,
        room_name: RoomName,
    },
    NewTask(RoomTask),
    /// `updates` には変更されたフィールドだけが含まれる
    TaskUpdated {
        task_id: TaskId,
        updates: TaskPatch,
    },
    TimerUpdate(TimerState),
    Chat(ChatMessage),
    UserJoined {
        user_id: UserId,
        connected_at: Timestamp,
    },
    UserLeft {
        user_id: UserId,
    },
    /// 未知の type のメッセージ（timestamp 付与済み）をそのまま転送
    Passthrough(Value),
}

impl RoomEvent {
    /// ログ用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::RoomUpdate { .. } => "room_update",
            RoomEvent::MemberApproved { .. } => "member_approved",
            RoomEvent::NewTask(_) => "new_task",
            RoomEvent::TaskUpdated { .. } => "task_updated",
            RoomEvent::TimerUpdate(_) => "timer_update",
            RoomEvent::Chat(_) => "chat_message",
            RoomEvent::UserJoined { .. } => "user_joined",
            RoomEvent::UserLeft { .. } => "user_left",
            RoomEvent::Passthrough(_) => "passthrough",
        }
    }
}

/// クライアントから届いたメッセージ
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Chat {
        id: Option<String>,
        user_name: Option<String>,
        content: String,
    },
    /// 旧クライアント向けの直接タイマー開始
    TimerStart { duration_minutes: Option<u32> },
    Unknown(Value),
}
