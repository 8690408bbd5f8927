//! UseCase: タスク更新
//!
//! パッチに含まれるフィールドだけを更新し、`task_updated` には変更したフィールドだけを載せます。
//! 空のパッチは何も書き込まず、配信もしません。

use std::sync::Arc;

use crate::domain::{
    ConnectionRegistry, RoomEvent, RoomId, RoomRepository, RoomTask, TaskId, TaskPatch, UserId,
};

use super::error::RoomError;

/// タスク更新のユースケース
pub struct UpdateTaskUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl UpdateTaskUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// タスクを部分更新し、更新後のタスクを返す
    ///
    /// # Errors
    ///
    /// * `RoomError::Forbidden` - 呼び出し元がメンバーではない
    /// * `RoomError::NotFound` - ルームまたはタスクが存在しない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        caller: &UserId,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> Result<RoomTask, RoomError> {
        let room = self.repository.get_room(room_id).await?;
        if !room.is_member(caller) {
            return Err(RoomError::Forbidden(
                "Only room members can update tasks".to_string(),
            ));
        }

        if patch.is_empty() {
            return room
                .tasks
                .into_iter()
                .find(|t| &t.id == task_id)
                .ok_or_else(|| RoomError::NotFound("Task not found".to_string()));
        }

        let task = self.repository.update_task(room_id, task_id, &patch).await?;
        tracing::info!("Task '{}' in room '{}' updated", task_id, room_id);

        self.registry
            .broadcast(
                room_id,
                &RoomEvent::TaskUpdated {
                    task_id: task_id.clone(),
                    updates: patch,
                },
            )
            .await;
        Ok(task)
    }
}
