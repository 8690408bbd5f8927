//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// メンバーシップ状態遷移のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("user '{0}' is already a member")]
    AlreadyMember(String),
    #[error("user '{0}' already has a pending request")]
    AlreadyPending(String),
    #[error("no pending request for user '{0}'")]
    PendingRequestNotFound(String),
}

/// パスワードハッシュのエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordHashError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is unreadable: {0}")]
    MalformedHash(String),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("task '{0}' not found")]
    TaskNotFound(String),
    #[error(transparent)]
    Membership(#[from] MembershipError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
