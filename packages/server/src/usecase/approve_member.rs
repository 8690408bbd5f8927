//! UseCase: 参加承認
//!
//! pending → member。オーナーのみ実行でき、ストア側で pending の削除と
//! member の追加を 1 操作として行います。
//!
//! 承認後は 2 種類のイベントを配信します。
//! - `member_approved`: 承認されたクライアントが待機画面から抜けるため
//! - `room_update{member_approved}`: 全クライアントのルーム状態の再取得

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Member, RoomEvent, RoomId, RoomRepository, RoomUpdateTrigger, Timestamp,
    UserId,
};

use super::error::RoomError;

/// 参加承認のユースケース
pub struct ApproveMemberUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ApproveMemberUseCase {
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

    /// 参加リクエストを承認
    ///
    /// # Errors
    ///
    /// * `RoomError::Forbidden` - 呼び出し元がオーナーではない
    /// * `RoomError::NotFound` - ルームまたは該当する申請が存在しない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        caller: &UserId,
        member_id: &UserId,
    ) -> Result<Member, RoomError> {
        let room = self.repository.get_room(room_id).await?;
        if !room.is_owner(caller) {
            tracing::warn!(
                "User '{}' tried to approve '{}' in room '{}' without ownership",
                caller,
                member_id,
                room_id
            );
            return Err(RoomError::Forbidden("Only owner can approve".to_string()));
        }

        let member = self
            .repository
            .approve_pending_request(room_id, member_id, Timestamp::new(self.clock.now_millis()))
            .await?;
        tracing::info!("User '{}' approved in room '{}'", member.user_id, room_id);

        self.registry
            .broadcast(
                room_id,
                &RoomEvent::MemberApproved {
                    user_id: member.user_id.clone(),
                    room_name: room.name,
                },
            )
            .await;
        self.registry
            .broadcast(
                room_id,
                &RoomEvent::RoomUpdate {
                    trigger: RoomUpdateTrigger::MemberApproved,
                },
            )
            .await;

        Ok(member)
    }
}
