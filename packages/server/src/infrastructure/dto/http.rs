//! HTTP API DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ========================================
// Requests
// ========================================

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveMemberQuery {
    pub member_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimerQuery {
    pub action: String,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSessionRequest {
    pub duration: i64,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

// ========================================
// Responses
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub user_id: String,
    pub name: String,
    pub status: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTaskDto {
    pub id: String,
    pub title: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUserDto {
    pub user_id: String,
    pub connected_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStateDto {
    pub timer_status: String,
    pub timer_duration: u32,
    pub timer_start_time: Option<String>,
}

/// Full room document as seen by clients (the password hash is never exposed)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room_id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub is_private: bool,
    pub active_users: Vec<ActiveUserDto>,
    pub members: Vec<MemberDto>,
    pub pending_requests: Vec<MemberDto>,
    pub tasks: Vec<RoomTaskDto>,
    pub chat_history: Vec<ChatMessageDto>,
    pub created_at: String,
    pub expires_at: String,
    #[serde(flatten)]
    pub timer: TimerStateDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub is_private: bool,
    pub member_count: usize,
    pub active_users: Vec<ActiveUserDto>,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreditResponse {
    pub message: String,
    pub duration: i64,
    pub credited_users: Vec<String>,
    /// Total credited but the heatmap bucket was not updated; do not retry these
    pub partially_credited_users: Vec<String>,
    pub failed_users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsDto {
    pub user_id: String,
    pub total_focus_minutes: u64,
    pub streak_count: u32,
    pub last_focus_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapEntryDto {
    pub date: String,
    pub total_minutes: u64,
    pub category_breakdown: BTreeMap<String, u64>,
}
