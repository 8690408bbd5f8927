//! Conversion logic between DTOs and domain entities.

use focusroom_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ActiveUser, ChatMessage, DisplayName, HeatmapEntry, Member, Room, RoomEvent, RoomTask,
    TaskPatch, TaskStatus, TimerState, UnknownTaskStatus, UserFocusStats, ValueObjectError,
};

use super::{
    http::{
        ActiveUserDto, ChatMessageDto, HeatmapEntryDto, MemberDto, RoomDetailDto, RoomSummaryDto,
        RoomTaskDto, TimerStateDto, UpdateTaskRequest, UserStatsDto,
    },
    websocket::{ServerMessage, TaskUpdatesDto},
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Member> for MemberDto {
    fn from(member: &Member) -> Self {
        Self {
            user_id: member.user_id.to_string(),
            name: member.display_name.to_string(),
            status: member.status.as_str().to_string(),
            joined_at: timestamp_to_rfc3339(member.joined_at.value()),
        }
    }
}

impl From<&RoomTask> for RoomTaskDto {
    fn from(task: &RoomTask) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.to_string(),
            status: task.status.as_str().to_string(),
            assigned_to: task.assigned_to.as_ref().map(ToString::to_string),
            created_by: task.created_by.to_string(),
            created_at: timestamp_to_rfc3339(task.created_at.value()),
        }
    }
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.to_string(),
            user_id: message.user_id.to_string(),
            user_name: message.user_name.to_string(),
            content: message.content.to_string(),
            timestamp: timestamp_to_rfc3339(message.timestamp.value()),
        }
    }
}

impl From<&ActiveUser> for ActiveUserDto {
    fn from(user: &ActiveUser) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            connected_at: timestamp_to_rfc3339(user.connected_at.value()),
        }
    }
}

impl From<&TimerState> for TimerStateDto {
    fn from(timer: &TimerState) -> Self {
        Self {
            timer_status: timer.status.as_str().to_string(),
            timer_duration: timer.duration_minutes,
            timer_start_time: timer.started_at.map(|t| timestamp_to_rfc3339(t.value())),
        }
    }
}

impl From<&TaskPatch> for TaskUpdatesDto {
    fn from(patch: &TaskPatch) -> Self {
        Self {
            status: patch.status.map(|s| s.as_str().to_string()),
            assigned_to: patch.assigned_to.as_ref().map(ToString::to_string),
        }
    }
}

impl From<&UserFocusStats> for UserStatsDto {
    fn from(stats: &UserFocusStats) -> Self {
        Self {
            user_id: stats.user_id.to_string(),
            total_focus_minutes: stats.total_focus_minutes,
            streak_count: stats.streak_count,
            last_focus_date: stats.last_focus_date.map(|d| d.to_string()),
        }
    }
}

impl From<&HeatmapEntry> for HeatmapEntryDto {
    fn from(entry: &HeatmapEntry) -> Self {
        Self {
            date: entry.date.to_string(),
            total_minutes: entry.total_minutes,
            category_breakdown: entry.category_breakdown.clone(),
        }
    }
}

pub fn room_detail_dto(room: &Room, active_users: &[ActiveUser]) -> RoomDetailDto {
    RoomDetailDto {
        room_id: room.id.to_string(),
        name: room.name.to_string(),
        description: room.description.clone(),
        owner_id: room.owner_id.to_string(),
        owner_name: room.owner_name().map(ToString::to_string),
        is_private: room.is_private,
        active_users: active_users.iter().map(ActiveUserDto::from).collect(),
        members: room.members.iter().map(MemberDto::from).collect(),
        pending_requests: room.pending_requests.iter().map(MemberDto::from).collect(),
        tasks: room.tasks.iter().map(RoomTaskDto::from).collect(),
        chat_history: room.chat_history.iter().map(ChatMessageDto::from).collect(),
        created_at: timestamp_to_rfc3339(room.created_at.value()),
        expires_at: timestamp_to_rfc3339(room.expires_at.value()),
        timer: TimerStateDto::from(&room.timer),
    }
}

pub fn room_summary_dto(room: &Room, active_users: &[ActiveUser]) -> RoomSummaryDto {
    RoomSummaryDto {
        room_id: room.id.to_string(),
        name: room.name.to_string(),
        description: room.description.clone(),
        owner_id: room.owner_id.to_string(),
        owner_name: room.owner_name().map(ToString::to_string),
        is_private: room.is_private,
        member_count: room.members.len(),
        active_users: active_users.iter().map(ActiveUserDto::from).collect(),
        created_at: timestamp_to_rfc3339(room.created_at.value()),
        expires_at: timestamp_to_rfc3339(room.expires_at.value()),
    }
}

/// Serialize a room event to the JSON text pushed to every connection.
///
/// Passthrough events are forwarded exactly as received.
pub fn encode_event(event: &RoomEvent) -> Result<String, serde_json::Error> {
    let message = match event {
        RoomEvent::Passthrough(raw) => return serde_json::to_string(raw),
        RoomEvent::RoomUpdate { trigger } => ServerMessage::RoomUpdate {
            trigger: trigger.as_str().to_string(),
        },
        RoomEvent::MemberApproved { user_id, room_name } => ServerMessage::MemberApproved {
            user_id: user_id.to_string(),
            room_name: room_name.to_string(),
        },
        RoomEvent::NewTask(task) => ServerMessage::NewTask { task: task.into() },
        RoomEvent::TaskUpdated { task_id, updates } => ServerMessage::TaskUpdated {
            task_id: task_id.to_string(),
            updates: updates.into(),
        },
        RoomEvent::TimerUpdate(timer) => ServerMessage::TimerUpdate {
            status: timer.status.as_str().to_string(),
            start_time: timer.started_at.map(|t| timestamp_to_rfc3339(t.value())),
            duration: timer.duration_minutes,
        },
        RoomEvent::Chat(message) => ServerMessage::ChatMessage(message.into()),
        RoomEvent::UserJoined {
            user_id,
            connected_at,
        } => ServerMessage::UserJoined {
            user_id: user_id.to_string(),
            connected_at: timestamp_to_rfc3339(connected_at.value()),
        },
        RoomEvent::UserLeft { user_id } => ServerMessage::UserLeft {
            user_id: user_id.to_string(),
        },
    };
    serde_json::to_string(&message)
}

// ========================================
// DTO → Domain
// ========================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskPatchError {
    #[error(transparent)]
    Status(#[from] UnknownTaskStatus),
    #[error(transparent)]
    Assignee(#[from] ValueObjectError),
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = TaskPatchError;

    /// Blank fields count as absent.
    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let status = request
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<TaskStatus>())
            .transpose()?;
        let assigned_to = request
            .assigned_to
            .filter(|s| !s.trim().is_empty())
            .map(DisplayName::new)
            .transpose()?;
        Ok(TaskPatch {
            status,
            assigned_to,
        })
    }
}
