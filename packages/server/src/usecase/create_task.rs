//! UseCase: タスク作成

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, RoomEvent, RoomId, RoomRepository, RoomTask, TaskTitle, Timestamp,
    UserIdentity,
};

use super::error::RoomError;

/// タスク作成のユースケース
pub struct CreateTaskUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl CreateTaskUseCase {
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

    /// `todo` のタスクを追加し `new_task` を配信
    ///
    /// # Errors
    ///
    /// * `RoomError::Forbidden` - 呼び出し元がメンバーではない
    /// * `RoomError::Validation` - タイトルが空
    pub async fn execute(
        &self,
        room_id: &RoomId,
        creator: &UserIdentity,
        title: String,
    ) -> Result<RoomTask, RoomError> {
        let room = self.repository.get_room(room_id).await?;
        if !room.is_member(&creator.user_id) {
            return Err(RoomError::Forbidden(
                "Only room members can add tasks".to_string(),
            ));
        }

        let task = RoomTask::new(
            TaskTitle::new(title)?,
            creator.display_name.clone(),
            Timestamp::new(self.clock.now_millis()),
        );
        self.repository.add_task(room_id, task.clone()).await?;
        tracing::info!("Task '{}' added to room '{}'", task.id, room_id);

        self.registry
            .broadcast(room_id, &RoomEvent::NewTask(task.clone()))
            .await;
        Ok(task)
    }
}
