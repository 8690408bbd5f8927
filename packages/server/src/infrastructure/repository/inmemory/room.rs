//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリのドキュメントストアとして使用します。
//!
//! 各メソッドはロックを 1 回だけ取得して完了するため、ドキュメントストアの
//! 単一ドキュメント更新（`$push` / `$pull` / 条件付き `$set`）と同じ原子性を持ちます。
//! ルームの TTL は `expires_at` と注入された Clock で判定します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use focusroom_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, Member, RepositoryError, Room, RoomId, RoomRepository, RoomTask, TaskId,
    TaskPatch, TimerState, Timestamp, UserId,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

/// 失効していないルームへの可変参照を取得
fn live_room<'a>(
    rooms: &'a mut HashMap<RoomId, Room>,
    room_id: &RoomId,
    now: Timestamp,
) -> Result<&'a mut Room, RepositoryError> {
    rooms
        .get_mut(room_id)
        .filter(|room| !room.is_expired(now))
        .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert_room(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        live_room(&mut rooms, room_id, now).map(|room| room.clone())
    }

    async fn list_rooms(&self, search: Option<&str>) -> Result<Vec<Room>, RepositoryError> {
        let now = self.now();
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let rooms = self.rooms.lock().await;
        let mut result: Vec<Room> = rooms
            .values()
            .filter(|room| !room.is_expired(now))
            .filter(|room| match &needle {
                Some(needle) => room.name.as_str().to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        // 新しいルームを先頭に
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn add_pending_request(
        &self,
        room_id: &RoomId,
        request: Member,
    ) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let room = live_room(&mut rooms, room_id, now)?;
        room.add_pending_request(request)?;
        Ok(())
    }

    async fn approve_pending_request(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        joined_at: Timestamp,
    ) -> Result<Member, RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let room = live_room(&mut rooms, room_id, now)?;
        Ok(room.approve_pending_request(user_id, joined_at)?)
    }

    async fn add_task(&self, room_id: &RoomId, task: RoomTask) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        live_room(&mut rooms, room_id, now)?.tasks.push(task);
        Ok(())
    }

    async fn update_task(
        &self,
        room_id: &RoomId,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<RoomTask, RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let task = live_room(&mut rooms, room_id, now)?
            .find_task_mut(task_id)
            .ok_or_else(|| RepositoryError::TaskNotFound(task_id.to_string()))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn add_chat_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
        history_limit: usize,
    ) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        live_room(&mut rooms, room_id, now)?.push_chat_message(message, history_limit);
        Ok(())
    }

    async fn compare_and_set_timer(
        &self,
        room_id: &RoomId,
        expected: &TimerState,
        next: TimerState,
    ) -> Result<bool, RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let room = live_room(&mut rooms, room_id, now)?;
        if &room.timer != expected {
            return Ok(false);
        }
        room.timer = next;
        Ok(true)
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<Vec<RoomId>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let expired: Vec<RoomId> = rooms
            .values()
            .filter(|room| room.is_expired(now))
            .map(|room| room.id.clone())
            .collect();
        for room_id in &expired {
            rooms.remove(room_id);
        }
        Ok(expired)
    }
}
