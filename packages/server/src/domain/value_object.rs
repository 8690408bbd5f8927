//! Value Object 定義
//!
//! 文字列やタイムスタンプをそのまま扱わず、生成時に検証済みの型として扱います。
//! 一度生成された Value Object は不変で、常に妥当な値を保持します。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// 文字列ベースの Value Object を定義するマクロ
///
/// 空文字列と最大長超過を拒否する `new` / `TryFrom<String>` を生成します。
macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// 最大文字数
            pub const MAX_LEN: usize = $max;

            /// 検証付きで生成
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueObjectError::Empty($field));
                }
                if trimmed.chars().count() > Self::MAX_LEN {
                    return Err(ValueObjectError::TooLong {
                        field: $field,
                        max: Self::MAX_LEN,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// Room の識別子（ストア上の不透明な ID）
    RoomId,
    "room_id",
    64
);
string_value_object!(
    /// 認証済みユーザーの識別子
    UserId,
    "user_id",
    128
);
string_value_object!(
    /// ルームタスクの識別子
    TaskId,
    "task_id",
    64
);
string_value_object!(
    /// チャットメッセージの識別子
    MessageId,
    "message_id",
    64
);
string_value_object!(
    /// ユーザーの表示名
    DisplayName,
    "display_name",
    64
);
string_value_object!(RoomName, "name", 100);
string_value_object!(TaskTitle, "title", 200);
string_value_object!(MessageContent, "content", 2000);

/// RoomId を生成するファクトリ
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// UUID v4 から新しい RoomId を生成
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        RoomId::new(Uuid::new_v4().simple().to_string())
    }
}

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

/// 1 本の WebSocket 接続を識別する ID
///
/// 同じユーザーが複数タブから接続しても、接続ごとに別の ID になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC の Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// 指定ミリ秒後のタイムスタンプ
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// `earlier` からの経過ミリ秒（負にはならない）
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}
