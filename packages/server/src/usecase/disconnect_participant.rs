//! UseCase: ルームからの切断

use std::sync::Arc;

use crate::domain::{ActiveUser, ConnectionId, ConnectionRegistry, RoomEvent, RoomId};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を取り除き、残りの接続に `user_left` を配信
    ///
    /// 既に取り除かれていた接続の場合は何も配信せず `None` を返します。
    /// 送信失敗で刈り取られた接続の退出はその時点でレジストリが配信済みで、
    /// 閉じられたルームには知らせる相手がいません。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Option<ActiveUser> {
        let user = self.registry.disconnect(room_id, connection_id).await?;
        tracing::info!("User '{}' disconnected from room '{}'", user.user_id, room_id);

        self.registry
            .broadcast(
                room_id,
                &RoomEvent::UserLeft {
                    user_id: user.user_id.clone(),
                },
            )
            .await;
        Some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, RoomUpdateTrigger, Timestamp},
        usecase::test_support::{Fixture, drain, user_id},
    };
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_departure_is_announced_with_real_user_id() {
        // テスト項目: 切断したユーザーの ID で user_left が残りの接続に届く
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut alice_rx = fixture.attach(&room_id, "alice").await;
        let (tx, _bob_rx) = mpsc::unbounded_channel();
        let bob_connection = ConnectionId::generate();
        fixture
            .registry
            .connect(
                &room_id,
                Connection {
                    id: bob_connection,
                    user_id: user_id("bob"),
                    connected_at: Timestamp::new(0),
                    channel: tx,
                },
            )
            .await;
        let usecase = DisconnectParticipantUseCase::new(fixture.registry());

        // when (操作):
        let left = usecase.execute(&room_id, bob_connection).await;
        let again = usecase.execute(&room_id, bob_connection).await;

        // then (期待する結果):
        assert_eq!(left.map(|u| u.user_id), Some(user_id("bob")));
        assert_eq!(again, None);
        assert_eq!(
            drain(&mut alice_rx),
            vec![serde_json::json!({"type": "user_left", "userId": "bob"})]
        );
    }

    #[tokio::test]
    async fn test_departure_pruned_by_broadcast_is_announced_once() {
        // テスト項目: 配信中に刈り取られた接続の退出は 1 度だけ知らされ、後の切断処理は重ねて配信しない
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut alice_rx = fixture.attach(&room_id, "alice").await;
        let (tx, bob_rx) = mpsc::unbounded_channel();
        let bob_connection = ConnectionId::generate();
        fixture
            .registry
            .connect(
                &room_id,
                Connection {
                    id: bob_connection,
                    user_id: user_id("bob"),
                    connected_at: Timestamp::new(0),
                    channel: tx,
                },
            )
            .await;
        drop(bob_rx);
        fixture
            .registry
            .broadcast(
                &room_id,
                &RoomEvent::RoomUpdate {
                    trigger: RoomUpdateTrigger::NewJoinRequest,
                },
            )
            .await;
        let usecase = DisconnectParticipantUseCase::new(fixture.registry());

        // when (操作): ソケット側の後片付けが遅れて走る
        let left = usecase.execute(&room_id, bob_connection).await;

        // then (期待する結果):
        assert_eq!(left, None);
        assert_eq!(
            drain(&mut alice_rx),
            vec![
                serde_json::json!({"type": "room_update", "trigger": "new_join_request"}),
                serde_json::json!({"type": "user_left", "userId": "bob"}),
            ]
        );
    }
}
