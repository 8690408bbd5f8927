//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{MembershipError, PasswordHashError, RepositoryError, ValueObjectError};

/// ルーム操作の失敗
///
/// HTTP / WebSocket のどちらから呼ばれても同じ分類で呼び出し元に返します。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("invalid room password")]
    InvalidCredential,
    #[error("user is already a member of this room")]
    AlreadyMember,
    #[error("join request is already pending")]
    AlreadyPending,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

impl RoomError {
    /// エラーの分類名（API レスポンスの `kind`）
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::NotFound(_) => "not_found",
            RoomError::Forbidden(_) => "forbidden",
            RoomError::InvalidCredential => "invalid_credential",
            RoomError::AlreadyMember | RoomError::AlreadyPending | RoomError::Conflict(_) => {
                "conflict"
            }
            RoomError::Validation(_) => "validation_error",
            RoomError::Storage(_) => "storage_error",
            RoomError::Internal(_) => "internal_error",
        }
    }
}

impl From<RepositoryError> for RoomError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::RoomNotFound(_) => RoomError::NotFound("Room not found".to_string()),
            RepositoryError::TaskNotFound(_) => RoomError::NotFound("Task not found".to_string()),
            RepositoryError::Membership(e) => e.into(),
            RepositoryError::Unavailable(message) => RoomError::Storage(message),
        }
    }
}

impl From<MembershipError> for RoomError {
    fn from(e: MembershipError) -> Self {
        match e {
            MembershipError::AlreadyMember(_) => RoomError::AlreadyMember,
            MembershipError::AlreadyPending(_) => RoomError::AlreadyPending,
            MembershipError::PendingRequestNotFound(_) => {
                RoomError::NotFound("Request not found".to_string())
            }
        }
    }
}

impl From<PasswordHashError> for RoomError {
    fn from(e: PasswordHashError) -> Self {
        RoomError::Internal(e.to_string())
    }
}

impl From<ValueObjectError> for RoomError {
    fn from(e: ValueObjectError) -> Self {
        RoomError::Validation(e.to_string())
    }
}
