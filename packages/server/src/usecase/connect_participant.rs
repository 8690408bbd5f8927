//! UseCase: ルームへの接続
//!
//! 接続はルームが存在すれば受け付けます。承認待ちのユーザーも接続して
//! `member_approved` を待てるよう、メンバーであることは求めません。
//!
//! WebSocket のハンドシェイク前には `ensure_room` で存在だけを確かめ、登録と
//! `user_joined` の配信はアップグレードが成立してから `execute` で行います。

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, PusherChannel, RoomEvent, RoomId,
    RoomRepository, Timestamp, UserId,
};

use super::error::RoomError;

/// 登録された接続
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedParticipant {
    pub connection_id: ConnectionId,
    pub connected_at: Timestamp,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
        }
    }

    /// ルームが存在することだけを確かめる（登録も配信もしない）
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - ルームが存在しない（失効済みを含む）
    pub async fn ensure_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.repository.get_room(room_id).await?;
        Ok(())
    }

    /// 接続を登録し、ルームに `user_joined` を配信
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - ルームが存在しない（失効済みを含む）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        channel: PusherChannel,
    ) -> Result<ConnectedParticipant, RoomError> {
        // ハンドシェイク中にルームが失効している場合がある
        self.ensure_room(room_id).await?;

        let participant = ConnectedParticipant {
            connection_id: ConnectionId::generate(),
            connected_at: Timestamp::new(self.clock.now_millis()),
        };
        self.registry
            .connect(
                room_id,
                Connection {
                    id: participant.connection_id,
                    user_id: user_id.clone(),
                    connected_at: participant.connected_at,
                    channel,
                },
            )
            .await;
        tracing::info!("User '{}' connected to room '{}'", user_id, room_id);

        self.registry
            .broadcast(
                room_id,
                &RoomEvent::UserJoined {
                    user_id,
                    connected_at: participant.connected_at,
                },
            )
            .await;
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{Fixture, drain, user_id};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connection_is_registered_and_announced() {
        // テスト項目: 接続が登録され、既存の接続と本人に user_joined が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut alice_rx = fixture.attach(&room_id, "alice").await;
        let usecase = ConnectParticipantUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.clock(),
        );
        let (tx, mut bob_rx) = mpsc::unbounded_channel();

        // when (操作):
        usecase.execute(&room_id, user_id("bob"), tx).await.unwrap();

        // then (期待する結果):
        assert_eq!(fixture.registry.connection_count(&room_id).await, 2);
        let expected = serde_json::json!({
            "type": "user_joined",
            "userId": "bob",
            "connectedAt": "2023-01-01T00:00:00.000Z",
        });
        assert_eq!(drain(&mut alice_rx), vec![expected.clone()]);
        assert_eq!(drain(&mut bob_rx), vec![expected]);
    }

    #[tokio::test]
    async fn test_unknown_room_is_rejected() {
        // テスト項目: 存在しないルームへの接続は not_found で、登録されない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = ConnectParticipantUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.clock(),
        );
        let room_id = RoomId::new("missing".to_string()).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = usecase.execute(&room_id, user_id("bob"), tx).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().kind(), "not_found");
        assert_eq!(fixture.registry.connection_count(&room_id).await, 0);
    }

    #[tokio::test]
    async fn test_room_check_leaves_no_presence_behind() {
        // テスト項目: ハンドシェイク前の存在確認だけでは接続が登録されず、何も配信されない
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut alice_rx = fixture.attach(&room_id, "alice").await;
        let usecase = ConnectParticipantUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作): bob のハンドシェイクが存在確認の後で放棄される
        let checked = usecase.ensure_room(&room_id).await;

        // then (期待する結果):
        assert!(checked.is_ok());
        assert_eq!(fixture.registry.connection_count(&room_id).await, 1);
        let active: Vec<String> = fixture
            .registry
            .active_users(&room_id)
            .await
            .into_iter()
            .map(|u| u.user_id.into_string())
            .collect();
        assert_eq!(active, vec!["alice"]);
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[tokio::test]
    async fn test_room_check_rejects_unknown_room() {
        // テスト項目: 存在しないルームはハンドシェイク前に not_found になる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = ConnectParticipantUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.clock(),
        );
        let room_id = RoomId::new("missing".to_string()).unwrap();

        // when (操作):
        let result = usecase.ensure_room(&room_id).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().kind(), "not_found");
    }
}
