//! UseCase 層
//!
//! 1 つの操作につき 1 つのユースケース構造体を持ち、依存は `Arc<dyn Trait>` で注入します。
//! 状態を変更したユースケースは永続化の後に ConnectionRegistry へイベントを配信します。

mod approve_member;
mod connect_participant;
mod control_timer;
mod create_room;
mod create_task;
mod disconnect_participant;
pub mod error;
mod get_room_detail;
mod get_rooms;
mod get_user_stats;
mod log_session;
mod purge_expired_rooms;
mod receive_message;
mod request_join;
mod update_task;

pub use approve_member::ApproveMemberUseCase;
pub use connect_participant::{ConnectParticipantUseCase, ConnectedParticipant};
pub use control_timer::ControlTimerUseCase;
pub use create_room::{CreateRoomInput, CreateRoomUseCase};
pub use create_task::CreateTaskUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::RoomError;
pub use get_room_detail::{GetRoomDetailUseCase, RoomView};
pub use get_rooms::GetRoomsUseCase;
pub use get_user_stats::{GetUserHeatmapUseCase, GetUserStatsUseCase, HEATMAP_DAYS};
pub use log_session::{LogSessionInput, LogSessionUseCase, SessionCreditReport};
pub use purge_expired_rooms::PurgeExpiredRoomsUseCase;
pub use receive_message::ReceiveMessageUseCase;
pub use request_join::RequestJoinUseCase;
pub use update_task::UpdateTaskUseCase;

/// ユースケースのテストで共有するフィクスチャ
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use argon2::Params;
    use focusroom_shared::time::{Clock, ManualClock};
    use tokio::sync::mpsc;

    use crate::{
        domain::{
            Connection, ConnectionId, ConnectionRegistry, DisplayName, NewRoom, PasswordHasher,
            Room, RoomId, RoomPolicy, RoomRepository, Timestamp, UserId, UserIdentity,
        },
        infrastructure::{
            connection_registry::WebSocketConnectionRegistry,
            password_hasher::Argon2PasswordHasher, repository::InMemoryRoomRepository,
        },
    };

    /// テスト用の最小コスト
    pub fn fast_params() -> Params {
        Params::new(
            Params::MIN_M_COST,
            Params::MIN_T_COST,
            Params::MIN_P_COST,
            None,
        )
        .unwrap()
    }

    /// 2023-01-01T00:00:00Z
    pub const START_MILLIS: i64 = 1_672_531_200_000;

    pub struct Fixture {
        pub clock: Arc<ManualClock>,
        pub repository: Arc<InMemoryRoomRepository>,
        pub registry: Arc<WebSocketConnectionRegistry>,
        pub hasher: Arc<Argon2PasswordHasher>,
        pub policy: RoomPolicy,
    }

    impl Fixture {
        pub fn new() -> Self {
            let clock = Arc::new(ManualClock::new(START_MILLIS));
            Self {
                repository: Arc::new(InMemoryRoomRepository::new(clock.clone())),
                registry: Arc::new(WebSocketConnectionRegistry::new()),
                hasher: Arc::new(Argon2PasswordHasher::with_params(fast_params())),
                policy: RoomPolicy::default(),
                clock,
            }
        }

        pub fn clock(&self) -> Arc<dyn Clock> {
            self.clock.clone()
        }

        pub fn repository(&self) -> Arc<dyn RoomRepository> {
            self.repository.clone()
        }

        pub fn registry(&self) -> Arc<dyn ConnectionRegistry> {
            self.registry.clone()
        }

        pub fn hasher(&self) -> Arc<dyn PasswordHasher> {
            self.hasher.clone()
        }

        /// `owner` を admin とするルームをストアに保存
        pub async fn seed_room(&self, room_id: &str, owner: &str, password: &str) -> RoomId {
            let id = RoomId::new(room_id.to_string()).unwrap();
            let room = Room::new(NewRoom {
                id: id.clone(),
                name: crate::domain::RoomName::new(format!("{room_id} room")).unwrap(),
                description: None,
                owner: identity(owner),
                password_hash: self.hasher.hash(password).unwrap(),
                created_at: Timestamp::new(self.clock.now_millis()),
                ttl_millis: self.policy.room_ttl_millis,
                timer_minutes: self.policy.default_timer_minutes,
            });
            self.repository.insert_room(room).await.unwrap();
            id
        }

        /// pending を経由せずにメンバーを追加
        pub async fn seed_member(&self, room_id: &RoomId, user: &str) {
            let now = Timestamp::new(self.clock.now_millis());
            self.repository
                .add_pending_request(room_id, crate::domain::Member::pending(identity(user), now))
                .await
                .unwrap();
            self.repository
                .approve_pending_request(room_id, &user_id(user), now)
                .await
                .unwrap();
        }

        /// ルームにライブ接続を登録し、その受信側を返す
        pub async fn attach(
            &self,
            room_id: &RoomId,
            user: &str,
        ) -> mpsc::UnboundedReceiver<String> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.registry
                .connect(
                    room_id,
                    Connection {
                        id: ConnectionId::generate(),
                        user_id: user_id(user),
                        connected_at: Timestamp::new(self.clock.now_millis()),
                        channel: tx,
                    },
                )
                .await;
            rx
        }
    }

    pub fn user_id(value: &str) -> UserId {
        UserId::new(value.to_string()).unwrap()
    }

    pub fn identity(value: &str) -> UserIdentity {
        UserIdentity::new(user_id(value), DisplayName::new(value.to_string()).unwrap())
    }

    /// 受信済みのメッセージを JSON として全て取り出す
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();
        while let Ok(text) = rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }
}
