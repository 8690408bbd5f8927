//! UseCase: タイマー操作
//!
//! ルームにつきタイマーは 1 つ。HTTP の操作と WebSocket の旧 `timer_start` の
//! どちらもこのユースケースを通り、同じ遷移と同じ `timer_update` 配信になります。
//!
//! ## 競合
//!
//! 読み取り → 計算 → 書き込みはストアの compare-and-set で 1 操作にまとめます。
//! 他のリクエストに先を越された場合は最新の状態で計算し直し、
//! `MAX_ATTEMPTS` 回続けて負けたら `Conflict` を返します。

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Room, RoomEvent, RoomId, RoomPolicy, RoomRepository, TimerCommand,
    TimerControlPolicy, TimerState, Timestamp, UserId,
};

use super::error::RoomError;

const MAX_ATTEMPTS: usize = 3;

/// タイマー操作のユースケース
pub struct ControlTimerUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl ControlTimerUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
            policy,
        }
    }

    /// コマンドを適用し、適用後のタイマー状態を返す
    ///
    /// running 以外での pause のように状態が変わらない場合は、
    /// 現在の状態を返して配信しません。
    ///
    /// # Errors
    ///
    /// * `RoomError::Forbidden` - ポリシー上タイマーを操作できない
    /// * `RoomError::Conflict` - 同時更新に負け続けた
    pub async fn execute(
        &self,
        room_id: &RoomId,
        caller: &UserId,
        command: TimerCommand,
    ) -> Result<TimerState, RoomError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let room = self.repository.get_room(room_id).await?;
            self.authorize(&room, caller)?;

            let now = Timestamp::new(self.clock.now_millis());
            let Some(next) = room
                .timer
                .apply(command, now, self.policy.default_timer_minutes)
            else {
                tracing::debug!(
                    "Timer command {:?} ignored in room '{}' (status: {})",
                    command,
                    room_id,
                    room.timer.status
                );
                return Ok(room.timer);
            };

            if self
                .repository
                .compare_and_set_timer(room_id, &room.timer, next)
                .await?
            {
                tracing::info!(
                    "Timer in room '{}' {} -> {} ({} min) by '{}'",
                    room_id,
                    room.timer.status,
                    next.status,
                    next.duration_minutes,
                    caller
                );
                self.registry
                    .broadcast(room_id, &RoomEvent::TimerUpdate(next))
                    .await;
                return Ok(next);
            }

            tracing::warn!(
                "Timer in room '{}' changed concurrently (attempt {}/{})",
                room_id,
                attempt,
                MAX_ATTEMPTS
            );
        }

        Err(RoomError::Conflict(
            "Timer was changed concurrently, please retry".to_string(),
        ))
    }

    fn authorize(&self, room: &Room, caller: &UserId) -> Result<(), RoomError> {
        let allowed = match self.policy.timer_control {
            TimerControlPolicy::OwnerOnly => room.is_owner(caller),
            TimerControlPolicy::AnyMember => room.is_member(caller),
        };
        if allowed {
            Ok(())
        } else {
            Err(RoomError::Forbidden(
                "Not allowed to control the timer in this room".to_string(),
            ))
        }
    }
}
