//! UseCase: セッションクレジット
//!
//! オーナーの明示的な操作で、ルームに「今接続している」ユーザー全員に
//! フォーカス時間を加算します。メンバー一覧ではなくプレゼンスが対象です。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 接続中ユーザーへの累計分数・ヒートマップ加算
//! - ユーザー単位の独立性（1 人の更新失敗が他に影響しない）
//! - 累計だけ加算されヒートマップが失敗したユーザーの報告
//! - 冪等キーによる二重加算の拒否
//!
//! ### どのような状況を想定しているか
//! - 正常系：3 人接続中に 45 分
//! - エッジケース：接続 0 人、duration が 0 以下
//! - 異常系：オーナー以外、ストアの部分的な失敗（mockall で再現）

use std::sync::Arc;

use chrono::NaiveDate;
use focusroom_shared::time::{Clock, timestamp_to_date};

use crate::domain::{
    ConnectionRegistry, ROOM_SESSION_CATEGORY, RepositoryError, RoomId, RoomRepository, UserId,
    UserStatsRepository,
};

use super::error::RoomError;

/// セッションクレジットの入力
#[derive(Debug, Clone, Default)]
pub struct LogSessionInput {
    pub duration_minutes: i64,
    /// 同じキーでの再実行を拒否するためのクライアント指定トークン
    pub idempotency_key: Option<String>,
}

/// セッションクレジットの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCreditReport {
    pub message: String,
    pub duration_minutes: u32,
    pub credited_users: Vec<UserId>,
    /// 累計分数は加算済みで、ヒートマップの加算だけが失敗したユーザー
    ///
    /// 再実行すると累計が二重に加算されるため、再試行の対象にしないこと。
    pub partially_credited_users: Vec<UserId>,
    /// 何も加算されなかったユーザー
    pub failed_users: Vec<UserId>,
}

/// 1 ユーザー分のクレジット結果
enum UserCredit {
    Credited,
    TotalOnly(RepositoryError),
    Failed(RepositoryError),
}

/// セッションクレジットのユースケース
pub struct LogSessionUseCase {
    room_repository: Arc<dyn RoomRepository>,
    stats_repository: Arc<dyn UserStatsRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl LogSessionUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        stats_repository: Arc<dyn UserStatsRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_repository,
            stats_repository,
            registry,
            clock,
        }
    }

    /// 接続中のユーザー全員にクレジットする
    ///
    /// # Errors
    ///
    /// * `RoomError::Forbidden` - 呼び出し元がオーナーではない
    /// * `RoomError::Conflict` - 冪等キーが既にこのルームで使われている
    pub async fn execute(
        &self,
        room_id: &RoomId,
        caller: &UserId,
        input: LogSessionInput,
    ) -> Result<SessionCreditReport, RoomError> {
        let room = self.room_repository.get_room(room_id).await?;
        if !room.is_owner(caller) {
            return Err(RoomError::Forbidden(
                "Only admin can log session credits".to_string(),
            ));
        }

        if input.duration_minutes <= 0 {
            return Ok(SessionCreditReport {
                message: "Duration too short to log".to_string(),
                duration_minutes: 0,
                credited_users: Vec::new(),
                partially_credited_users: Vec::new(),
                failed_users: Vec::new(),
            });
        }
        let minutes = u32::try_from(input.duration_minutes)
            .map_err(|_| RoomError::Validation("duration is too large".to_string()))?;

        if let Some(key) = input
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            if !self.stats_repository.claim_credit_key(room_id, key).await? {
                tracing::warn!(
                    "Session credit for room '{}' rejected: key '{}' already used",
                    room_id,
                    key
                );
                return Err(RoomError::Conflict(
                    "Session already logged for this idempotency key".to_string(),
                ));
            }
        }

        let today = timestamp_to_date(self.clock.now_millis());
        let active_users = self.registry.active_users(room_id).await;

        let mut credited_users = Vec::new();
        let mut partially_credited_users = Vec::new();
        let mut failed_users = Vec::new();
        for user in active_users {
            match self.credit_user(&user.user_id, minutes, today).await {
                UserCredit::Credited => credited_users.push(user.user_id),
                UserCredit::TotalOnly(e) => {
                    tracing::error!(
                        "Credited {} min to '{}' in room '{}' but heatmap update failed: {}",
                        minutes,
                        user.user_id,
                        room_id,
                        e
                    );
                    partially_credited_users.push(user.user_id);
                }
                UserCredit::Failed(e) => {
                    tracing::error!(
                        "Failed to credit {} min to '{}' in room '{}': {}",
                        minutes,
                        user.user_id,
                        room_id,
                        e
                    );
                    failed_users.push(user.user_id);
                }
            }
        }

        tracing::info!(
            "Logged {} min in room '{}' for {} user(s), {} partial, {} failed",
            minutes,
            room_id,
            credited_users.len(),
            partially_credited_users.len(),
            failed_users.len()
        );
        Ok(SessionCreditReport {
            message: format!(
                "Logged {} minutes for {} users",
                minutes,
                credited_users.len()
            ),
            duration_minutes: minutes,
            credited_users,
            partially_credited_users,
            failed_users,
        })
    }

    /// 累計 → ヒートマップの順に加算する。2 つの更新は 1 つのトランザクションではない
    async fn credit_user(&self, user_id: &UserId, minutes: u32, today: NaiveDate) -> UserCredit {
        if let Err(e) = self
            .stats_repository
            .credit_focus_minutes(user_id, minutes, today)
            .await
        {
            return UserCredit::Failed(e);
        }
        match self
            .stats_repository
            .add_heatmap_minutes(user_id, today, ROOM_SESSION_CATEGORY, minutes)
            .await
        {
            Ok(_) => UserCredit::Credited,
            Err(e) => UserCredit::TotalOnly(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{HeatmapEntry, MockUserStatsRepository, UserFocusStats},
        infrastructure::repository::InMemoryUserStatsRepository,
        usecase::test_support::{Fixture, START_MILLIS, user_id},
    };

    fn today() -> NaiveDate {
        timestamp_to_date(START_MILLIS)
    }

    fn input(minutes: i64, key: Option<&str>) -> LogSessionInput {
        LogSessionInput {
            duration_minutes: minutes,
            idempotency_key: key.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_every_active_user_is_credited_once() {
        // テスト項目: 接続中の 3 人それぞれに 45 分が累計・ヒートマップに加算される
        // given (前提条件):
        let fixture = Fixture::new();
        let stats = Arc::new(InMemoryUserStatsRepository::new());
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let _a = fixture.attach(&room_id, "alice").await;
        let _b = fixture.attach(&room_id, "bob").await;
        let _c = fixture.attach(&room_id, "carol").await;
        let _c2 = fixture.attach(&room_id, "carol").await;
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            stats.clone(),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let report = usecase
            .execute(&room_id, &user_id("alice"), input(45, None))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.message, "Logged 45 minutes for 3 users");
        assert_eq!(report.credited_users.len(), 3);
        assert!(report.failed_users.is_empty());
        for user in ["alice", "bob", "carol"] {
            let user_stats = stats.get_stats(&user_id(user)).await.unwrap();
            assert_eq!(user_stats.total_focus_minutes, 45);
            assert_eq!(user_stats.last_focus_date, Some(today()));
            let heatmap = stats.get_heatmap(&user_id(user), 10).await.unwrap();
            assert_eq!(heatmap.len(), 1);
            assert_eq!(heatmap[0].total_minutes, 45);
            assert_eq!(heatmap[0].category_breakdown.get("Study"), Some(&45));
        }
    }

    #[tokio::test]
    async fn test_no_active_users_succeeds_without_updates() {
        // テスト項目: 接続 0 人なら更新なしで成功
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let mut mock = MockUserStatsRepository::new();
        mock.expect_credit_focus_minutes().never();
        mock.expect_add_heatmap_minutes().never();
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            Arc::new(mock),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let report = usecase
            .execute(&room_id, &user_id("alice"), input(45, None))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.message, "Logged 45 minutes for 0 users");
        assert!(report.credited_users.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_user_does_not_block_others() {
        // テスト項目: 1 人の更新が失敗しても他のユーザーには加算される
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let _a = fixture.attach(&room_id, "alice").await;
        let _b = fixture.attach(&room_id, "bob").await;
        let mut mock = MockUserStatsRepository::new();
        mock.expect_credit_focus_minutes()
            .times(2)
            .returning(|user, minutes, today| {
                if user.as_str() == "bob" {
                    return Err(RepositoryError::Unavailable("stats store down".to_string()));
                }
                let mut stats = UserFocusStats::empty(user.clone());
                stats.credit(minutes, today);
                Ok(stats)
            });
        mock.expect_add_heatmap_minutes()
            .times(1)
            .returning(|user, date, category, minutes| {
                let mut entry = HeatmapEntry::empty(user.clone(), date);
                entry.add(category, minutes);
                Ok(entry)
            });
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            Arc::new(mock),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let report = usecase
            .execute(&room_id, &user_id("alice"), input(30, None))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.credited_users, vec![user_id("alice")]);
        assert!(report.partially_credited_users.is_empty());
        assert_eq!(report.failed_users, vec![user_id("bob")]);
    }

    #[tokio::test]
    async fn test_heatmap_failure_is_reported_as_partial_credit() {
        // テスト項目: 累計は加算できてヒートマップだけ失敗したユーザーは failed ではなく partial として報告される
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let _a = fixture.attach(&room_id, "alice").await;
        let _b = fixture.attach(&room_id, "bob").await;
        let mut mock = MockUserStatsRepository::new();
        mock.expect_credit_focus_minutes()
            .times(2)
            .returning(|user, minutes, today| {
                let mut stats = UserFocusStats::empty(user.clone());
                stats.credit(minutes, today);
                Ok(stats)
            });
        mock.expect_add_heatmap_minutes()
            .times(2)
            .returning(|user, date, category, minutes| {
                if user.as_str() == "bob" {
                    return Err(RepositoryError::Unavailable("heatmap store down".to_string()));
                }
                let mut entry = HeatmapEntry::empty(user.clone(), date);
                entry.add(category, minutes);
                Ok(entry)
            });
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            Arc::new(mock),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let report = usecase
            .execute(&room_id, &user_id("alice"), input(30, None))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.credited_users, vec![user_id("alice")]);
        assert_eq!(report.partially_credited_users, vec![user_id("bob")]);
        assert!(report.failed_users.is_empty());
        assert_eq!(report.message, "Logged 30 minutes for 1 users");
    }

    #[tokio::test]
    async fn test_owner_only_and_short_duration() {
        // テスト項目: オーナー以外は forbidden、0 分以下は何もせずメッセージを返す
        // given (前提条件):
        let fixture = Fixture::new();
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        fixture.seed_member(&room_id, "bob").await;
        let _b = fixture.attach(&room_id, "bob").await;
        let mut mock = MockUserStatsRepository::new();
        mock.expect_credit_focus_minutes().never();
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            Arc::new(mock),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let by_member = usecase
            .execute(&room_id, &user_id("bob"), input(25, None))
            .await;
        let too_short = usecase
            .execute(&room_id, &user_id("alice"), input(0, None))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(by_member.unwrap_err().kind(), "forbidden");
        assert_eq!(too_short.message, "Duration too short to log");
        assert_eq!(too_short.duration_minutes, 0);
    }

    #[tokio::test]
    async fn test_repeated_idempotency_key_is_rejected() {
        // テスト項目: 同じ冪等キーでの再実行は conflict で、二重加算されない
        // given (前提条件):
        let fixture = Fixture::new();
        let stats = Arc::new(InMemoryUserStatsRepository::new());
        let room_id = fixture.seed_room("r1", "alice", "p1").await;
        let _a = fixture.attach(&room_id, "alice").await;
        let usecase = LogSessionUseCase::new(
            fixture.repository(),
            stats.clone(),
            fixture.registry(),
            fixture.clock(),
        );

        // when (操作):
        let first = usecase
            .execute(&room_id, &user_id("alice"), input(25, Some("session-1")))
            .await;
        let retry = usecase
            .execute(&room_id, &user_id("alice"), input(25, Some("session-1")))
            .await;
        let without_key = usecase
            .execute(&room_id, &user_id("alice"), input(25, None))
            .await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert_eq!(retry.unwrap_err().kind(), "conflict");
        assert!(without_key.is_ok());
        let alice = stats.get_stats(&user_id("alice")).await.unwrap();
        assert_eq!(alice.total_focus_minutes, 50);
    }
}
