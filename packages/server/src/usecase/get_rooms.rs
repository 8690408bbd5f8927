//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, RoomRepository};

use super::{error::RoomError, get_room_detail::RoomView};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 失効していないルームを新しい順に返す
    ///
    /// `search` が空白のみの場合は絞り込みなしとして扱います。
    pub async fn execute(&self, search: Option<&str>) -> Result<Vec<RoomView>, RoomError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let rooms = self.repository.list_rooms(search).await?;

        let mut views = Vec::with_capacity(rooms.len());
        for room in rooms {
            let active_users = self.registry.active_users(&room.id).await;
            views.push(RoomView { room, active_users });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::Fixture;

    #[tokio::test]
    async fn test_search_matches_name_case_insensitively() {
        // テスト項目: 名前の部分一致（大文字小文字を区別しない）で絞り込む
        // given (前提条件):
        let fixture = Fixture::new();
        fixture.seed_room("math", "alice", "p1").await;
        fixture.seed_room("physics", "bob", "p2").await;
        let usecase = GetRoomsUseCase::new(fixture.repository(), fixture.registry());

        // when (操作):
        let all = usecase.execute(None).await.unwrap();
        let blank = usecase.execute(Some("  ")).await.unwrap();
        let matched = usecase.execute(Some("MATH")).await.unwrap();

        // then (期待する結果):
        assert_eq!(all.len(), 2);
        assert_eq!(blank.len(), 2);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].room.id.as_str(), "math");
    }

    #[tokio::test]
    async fn test_each_room_carries_its_own_presence() {
        // テスト項目: 各ルームには自分のライブ接続だけが含まれる
        // given (前提条件):
        let fixture = Fixture::new();
        let math = fixture.seed_room("math", "alice", "p1").await;
        fixture.seed_room("physics", "bob", "p2").await;
        let _rx = fixture.attach(&math, "alice").await;
        let usecase = GetRoomsUseCase::new(fixture.repository(), fixture.registry());

        // when (操作):
        let views = usecase.execute(None).await.unwrap();

        // then (期待する結果):
        for view in views {
            let expected = usize::from(view.room.id == math);
            assert_eq!(view.active_users.len(), expected);
        }
    }
}
