//! UseCase: ルーム作成
//!
//! 作成者は admin としてメンバーに含まれ、ルームは作成から TTL 経過後に失効します。

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    NewRoom, PasswordHasher, Room, RoomIdFactory, RoomName, RoomPolicy, RoomRepository,
    Timestamp, UserIdentity,
};

use super::error::RoomError;

/// ルーム作成の入力
#[derive(Debug, Clone)]
pub struct CreateRoomInput {
    pub name: String,
    pub password: String,
    pub description: Option<String>,
}

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl CreateRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            repository,
            password_hasher,
            clock,
            policy,
        }
    }

    /// ルームを作成して保存
    ///
    /// # Errors
    ///
    /// * `RoomError::Validation` - 名前またはパスワードが空
    /// * `RoomError::Internal` - パスワードのハッシュ化に失敗
    pub async fn execute(
        &self,
        owner: UserIdentity,
        input: CreateRoomInput,
    ) -> Result<Room, RoomError> {
        let name = RoomName::new(input.name)?;
        if input.password.is_empty() {
            return Err(RoomError::Validation("password must not be empty".to_string()));
        }
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let room = Room::new(NewRoom {
            id: RoomIdFactory::generate()?,
            name,
            description,
            owner,
            password_hash: self.password_hasher.hash(&input.password)?,
            created_at: Timestamp::new(self.clock.now_millis()),
            ttl_millis: self.policy.room_ttl_millis,
            timer_minutes: self.policy.default_timer_minutes,
        });
        self.repository.insert_room(room.clone()).await?;

        tracing::info!(
            "Room '{}' ({}) created by '{}'",
            room.name,
            room.id,
            room.owner_id
        );
        Ok(room)
    }
}
