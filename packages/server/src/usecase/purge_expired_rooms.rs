//! UseCase: 失効ルームの削除
//!
//! 失効したルームは読み取りからは即座に見えなくなりますが、ストアからの削除と
//! ライブ接続のクローズはこのユースケースを定期実行して行います。

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{ConnectionRegistry, RoomId, RoomRepository, Timestamp};

use super::error::RoomError;

pub struct PurgeExpiredRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl PurgeExpiredRoomsUseCase {
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

    /// 削除したルームの ID を返す
    pub async fn execute(&self) -> Result<Vec<RoomId>, RoomError> {
        let purged = self
            .repository
            .purge_expired(Timestamp::new(self.clock.now_millis()))
            .await?;
        for room_id in &purged {
            let closed = self.registry.close_room(room_id).await;
            tracing::info!(
                "Room '{}' expired, closed {} connection(s)",
                room_id,
                closed
            );
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::Fixture;

    #[tokio::test]
    async fn test_expired_room_is_deleted_and_connections_closed() {
        // テスト項目: 失効したルームだけが削除され、その接続が閉じられる
        // given (前提条件):
        let fixture = Fixture::new();
        let old = fixture.seed_room("old", "alice", "p1").await;
        let mut old_rx = fixture.attach(&old, "alice").await;
        fixture.clock.advance_minutes(60);
        let fresh = fixture.seed_room("fresh", "bob", "p2").await;
        let _fresh_rx = fixture.attach(&fresh, "bob").await;
        fixture.clock.advance(fixture.policy.room_ttl_millis - 30 * 60_000);
        let usecase = PurgeExpiredRoomsUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let purged = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(purged, vec![old.clone()]);
        assert_eq!(old_rx.recv().await, None);
        assert_eq!(fixture.registry.connection_count(&fresh).await, 1);
        assert!(fixture.repository.get_room(&fresh).await.is_ok());
    }
}
