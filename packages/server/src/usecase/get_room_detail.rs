//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{ActiveUser, ConnectionRegistry, Room, RoomId, RoomRepository};

use super::error::RoomError;

/// ルームドキュメントとライブ接続から導いたプレゼンス
#[derive(Debug, Clone)]
pub struct RoomView {
    pub room: Room,
    pub active_users: Vec<ActiveUser>,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 失効済みのルームは `NotFound`
    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomView, RoomError> {
        let room = self.repository.get_room(room_id).await?;
        let active_users = self.registry.active_users(room_id).await;
        Ok(RoomView { room, active_users })
    }
}
