//! エンティティ定義
//!
//! `Room` はストアに保存されるルームドキュメント全体を表します。
//! メンバー、参加リクエスト、タスク、チャット履歴、タイマー状態を内包します。

use std::{fmt, str::FromStr};

use super::{
    error::MembershipError,
    timer::TimerState,
    value_object::{
        DisplayName, MessageContent, MessageId, RoomId, RoomName, TaskId, TaskTitle, Timestamp,
        UserId,
    },
};

/// 認証済みユーザー（外部の認証基盤が発行するハンドル）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub display_name: DisplayName,
}

impl UserIdentity {
    pub fn new(user_id: UserId, display_name: DisplayName) -> Self {
        Self {
            user_id,
            display_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Pending,
    Member,
    Admin,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Member => "member",
            MemberStatus::Admin => "admin",
        }
    }
}

/// ルームのメンバー、または参加リクエスト（status = pending）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub status: MemberStatus,
    pub joined_at: Timestamp,
}

impl Member {
    pub fn pending(identity: UserIdentity, requested_at: Timestamp) -> Self {
        Self {
            user_id: identity.user_id,
            display_name: identity.display_name,
            status: MemberStatus::Pending,
            joined_at: requested_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status '{0}' (expected todo, in_progress or completed)")]
pub struct UnknownTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownTaskStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(UnknownTaskStatus(other.to_string())),
        }
    }
}

/// ルームで共有されるタスク（削除操作は存在しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTask {
    pub id: TaskId,
    pub title: TaskTitle,
    pub status: TaskStatus,
    pub assigned_to: Option<DisplayName>,
    pub created_by: DisplayName,
    pub created_at: Timestamp,
}

impl RoomTask {
    /// status = todo の新規タスク
    pub fn new(title: TaskTitle, created_by: DisplayName, created_at: Timestamp) -> Self {
        Self {
            id: TaskId::generate(),
            title,
            status: TaskStatus::Todo,
            assigned_to: None,
            created_by,
            created_at,
        }
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = &patch.assigned_to {
            self.assigned_to = Some(assignee.clone());
        }
    }
}

/// タスクの部分更新。`None` のフィールドは変更しない
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<DisplayName>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to.is_none()
    }
}

/// チャットメッセージ（timestamp は常にサーバーが付与）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub user_id: UserId,
    pub user_name: DisplayName,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

/// ルームドキュメント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub password_hash: String,
    pub is_private: bool,
    pub members: Vec<Member>,
    pub pending_requests: Vec<Member>,
    pub tasks: Vec<RoomTask>,
    pub chat_history: Vec<ChatMessage>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub timer: TimerState,
}

/// ルーム作成時のパラメータ
pub struct NewRoom {
    pub id: RoomId,
    pub name: RoomName,
    pub description: Option<String>,
    pub owner: UserIdentity,
    pub password_hash: String,
    pub created_at: Timestamp,
    pub ttl_millis: i64,
    pub timer_minutes: u32,
}

impl Room {
    /// 作成者を admin として含むルームを作成
    pub fn new(params: NewRoom) -> Self {
        let owner = Member {
            user_id: params.owner.user_id.clone(),
            display_name: params.owner.display_name,
            status: MemberStatus::Admin,
            joined_at: params.created_at,
        };
        Self {
            id: params.id,
            name: params.name,
            description: params.description,
            owner_id: params.owner.user_id,
            password_hash: params.password_hash,
            is_private: true,
            members: vec![owner],
            pending_requests: Vec::new(),
            tasks: Vec::new(),
            chat_history: Vec::new(),
            created_at: params.created_at,
            expires_at: params.created_at.plus_millis(params.ttl_millis),
            timer: TimerState::stopped(params.timer_minutes),
        }
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|m| &m.user_id == user_id)
    }

    pub fn is_pending(&self, user_id: &UserId) -> bool {
        self.pending_requests.iter().any(|m| &m.user_id == user_id)
    }

    pub fn owner_name(&self) -> Option<&DisplayName> {
        self.members
            .iter()
            .find(|m| m.user_id == self.owner_id)
            .map(|m| &m.display_name)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// 参加リクエストを追加
    ///
    /// 同じユーザーが members と pending_requests の両方に現れることはありません。
    pub fn add_pending_request(&mut self, request: Member) -> Result<(), MembershipError> {
        if self.is_member(&request.user_id) {
            return Err(MembershipError::AlreadyMember(request.user_id.into_string()));
        }
        if self.is_pending(&request.user_id) {
            return Err(MembershipError::AlreadyPending(request.user_id.into_string()));
        }
        self.pending_requests.push(Member {
            status: MemberStatus::Pending,
            ..request
        });
        Ok(())
    }

    /// 参加リクエストを承認し、member として追加
    pub fn approve_pending_request(
        &mut self,
        user_id: &UserId,
        joined_at: Timestamp,
    ) -> Result<Member, MembershipError> {
        let position = self
            .pending_requests
            .iter()
            .position(|m| &m.user_id == user_id)
            .ok_or_else(|| MembershipError::PendingRequestNotFound(user_id.to_string()))?;
        let pending = self.pending_requests.remove(position);
        let member = Member {
            user_id: pending.user_id,
            display_name: pending.display_name,
            status: MemberStatus::Member,
            joined_at,
        };
        self.members.push(member.clone());
        Ok(member)
    }

    pub fn find_task_mut(&mut self, task_id: &TaskId) -> Option<&mut RoomTask> {
        self.tasks.iter_mut().find(|t| &t.id == task_id)
    }

    /// チャット履歴に追加し、上限を超えた古いメッセージを捨てる
    pub fn push_chat_message(&mut self, message: ChatMessage, history_limit: usize) {
        self.chat_history.push(message);
        if self.chat_history.len() > history_limit {
            let overflow = self.chat_history.len() - history_limit;
            self.chat_history.drain(..overflow);
        }
    }
}
