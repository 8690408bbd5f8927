//! UseCase: 参加リクエスト
//!
//! ## 状態遷移
//!
//! none → pending。パスワードが一致した場合のみ pending として登録し、
//! オーナーのクライアントが再取得できるよう `room_update{new_join_request}` を配信します。

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Member, PasswordHasher, RoomEvent, RoomId, RoomRepository,
    RoomUpdateTrigger, Timestamp, UserIdentity,
};

use super::error::RoomError;

/// 参加リクエストのユースケース
pub struct RequestJoinUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    password_hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl RequestJoinUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        password_hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            password_hasher,
            clock,
        }
    }

    /// 参加リクエストを登録
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - ルームが存在しない（失効済みを含む）
    /// * `RoomError::AlreadyMember` - 既にメンバー
    /// * `RoomError::InvalidCredential` - パスワード不一致
    /// * `RoomError::AlreadyPending` - 既に申請中
    /// * `RoomError::Internal` - 保存済みのパスワードハッシュが読めない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        requester: UserIdentity,
        password: &str,
    ) -> Result<Member, RoomError> {
        let room = self.repository.get_room(room_id).await?;

        if room.is_member(&requester.user_id) {
            return Err(RoomError::AlreadyMember);
        }
        if !self.password_hasher.verify(password, &room.password_hash)? {
            tracing::warn!(
                "Join request from '{}' to room '{}' rejected: invalid password",
                requester.user_id,
                room_id
            );
            return Err(RoomError::InvalidCredential);
        }

        // pending の重複はストア側の条件付き追加で判定する
        let request = Member::pending(requester, Timestamp::new(self.clock.now_millis()));
        self.repository
            .add_pending_request(room_id, request.clone())
            .await?;

        tracing::info!(
            "User '{}' requested to join room '{}'",
            request.user_id,
            room_id
        );
        self.registry
            .broadcast(
                room_id,
                &RoomEvent::RoomUpdate {
                    trigger: RoomUpdateTrigger::NewJoinRequest,
                },
            )
            .await;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MemberStatus,
        usecase::test_support::{Fixture, drain, identity, user_id},
    };

    fn usecase(fixture: &Fixture) -> RequestJoinUseCase {
        RequestJoinUseCase::new(
            fixture.repository(),
            fixture.registry(),
            fixture.hasher(),
            fixture.clock(),
        )
    }

    #[tokio::test]
    async fn test_correct_password_creates_pending_request_and_notifies_room() {
        // テスト項目: 正しいパスワードで pending に 1 件追加され、room_update が配信される
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut owner_rx = fixture.attach(&room_id, "alice").await;

        // when (操作):
        let request = usecase(&fixture)
            .execute(&room_id, identity("bob"), "p1")
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(request.status, MemberStatus::Pending);
        let room = fixture.repository.get_room(&room_id).await.unwrap();
        assert_eq!(room.pending_requests.len(), 1);
        assert_eq!(room.pending_requests[0].user_id, user_id("bob"));
        assert!(!room.is_member(&user_id("bob")));
        assert_eq!(
            drain(&mut owner_rx),
            vec![serde_json::json!({"type": "room_update", "trigger": "new_join_request"})]
        );
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_user_absent() {
        // テスト項目: パスワード不一致なら invalid_credential で、members にも pending にも現れない
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut owner_rx = fixture.attach(&room_id, "alice").await;

        // when (操作):
        let result = usecase(&fixture).execute(&room_id, identity("bob"), "nope").await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomError::InvalidCredential);
        let room = fixture.repository.get_room(&room_id).await.unwrap();
        assert!(room.pending_requests.is_empty());
        assert!(!room.is_member(&user_id("bob")));
        assert!(drain(&mut owner_rx).is_empty());
    }

    #[tokio::test]
    async fn test_member_and_pending_are_rejected() {
        // テスト項目: 既存メンバーは AlreadyMember、申請中の再申請は AlreadyPending
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let usecase = usecase(&fixture);
        usecase.execute(&room_id, identity("bob"), "p1").await.unwrap();

        // when (操作):
        let owner_again = usecase.execute(&room_id, identity("alice"), "p1").await;
        let bob_again = usecase.execute(&room_id, identity("bob"), "p1").await;

        // then (期待する結果):
        assert_eq!(owner_again.unwrap_err(), RoomError::AlreadyMember);
        assert_eq!(bob_again.unwrap_err(), RoomError::AlreadyPending);
        let room = fixture.repository.get_room(&room_id).await.unwrap();
        assert_eq!(room.pending_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        // テスト項目: 存在しないルームへの申請は not_found
        let fixture = Fixture::new();
        let missing = RoomId::new("missing".to_string()).unwrap();
        let result = usecase(&fixture).execute(&missing, identity("bob"), "p1").await;
        assert_eq!(result.unwrap_err().kind(), "not_found");
    }
}
