//! Domain layer: value objects, entities, the timer state machine, room events
//! and the interfaces the use cases depend on.

pub mod connection_registry;
pub mod entity;
pub mod error;
pub mod event;
pub mod password;
pub mod policy;
pub mod repository;
pub mod stats;
pub mod timer;
pub mod value_object;

pub use connection_registry::{ActiveUser, Connection, ConnectionRegistry, PusherChannel};
pub use entity::{
    ChatMessage, Member, MemberStatus, NewRoom, Room, RoomTask, TaskPatch, TaskStatus,
    UnknownTaskStatus, UserIdentity,
};
pub use error::{MembershipError, PasswordHashError, RepositoryError, ValueObjectError};
pub use event::{InboundMessage, RoomEvent, RoomUpdateTrigger};
pub use password::PasswordHasher;
pub use policy::{RoomPolicy, TimerControlPolicy};
pub use repository::{RoomRepository, UserStatsRepository};
pub use stats::{HeatmapEntry, ROOM_SESSION_CATEGORY, UserFocusStats};
pub use timer::{TimerCommand, TimerState, TimerStatus, UnknownTimerAction};
pub use value_object::{
    ConnectionId, DisplayName, MessageContent, MessageId, RoomId, RoomIdFactory, RoomName,
    TaskId, TaskTitle, Timestamp, UserId,
};

#[cfg(test)]
pub use repository::MockUserStatsRepository;
