//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性
//!
//! 各メソッドは 1 回のストア操作として原子的に実行されます。
//! 「読んでから書く」をユースケース側で行うと、同じルームへの並行リクエストで
//! 競合するため、メンバー承認・タスク更新・タイマー遷移は条件付き更新として表現します。

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{
    ChatMessage, HeatmapEntry, Member, RepositoryError, Room, RoomId, RoomTask, TaskId,
    TaskPatch, TimerState, Timestamp, UserFocusStats, UserId,
};

/// Room Repository trait
///
/// ルームドキュメントのストア。失効済みのルームは存在しないものとして扱います。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを保存
    async fn insert_room(&self, room: Room) -> Result<(), RepositoryError>;

    /// ルームを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 名前に `search` を含む（大文字小文字を区別しない）ルームの一覧
    async fn list_rooms(&self, search: Option<&str>) -> Result<Vec<Room>, RepositoryError>;

    /// 参加リクエストを追加（member / pending の重複は拒否）
    async fn add_pending_request(
        &self,
        room_id: &RoomId,
        request: Member,
    ) -> Result<(), RepositoryError>;

    /// pending から取り除き member として追加する（pull と push を 1 操作で）
    async fn approve_pending_request(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        joined_at: Timestamp,
    ) -> Result<Member, RepositoryError>;

    /// タスクを追加
    async fn add_task(&self, room_id: &RoomId, task: RoomTask) -> Result<(), RepositoryError>;

    /// `room AND task.id` に一致するタスクだけを部分更新
    async fn update_task(
        &self,
        room_id: &RoomId,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<RoomTask, RepositoryError>;

    /// チャットメッセージを追加（上限を超えた古いメッセージは捨てる）
    async fn add_chat_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
        history_limit: usize,
    ) -> Result<(), RepositoryError>;

    /// 現在のタイマーが `expected` と一致する場合のみ `next` に置き換える
    ///
    /// 置き換えた場合は `true`、他のリクエストが先に更新していた場合は `false`。
    async fn compare_and_set_timer(
        &self,
        room_id: &RoomId,
        expected: &TimerState,
        next: TimerState,
    ) -> Result<bool, RepositoryError>;

    /// 失効済みのルームを削除し、その ID を返す
    async fn purge_expired(&self, now: Timestamp) -> Result<Vec<RoomId>, RepositoryError>;
}

/// ユーザー統計の Repository trait
///
/// 各メソッドはユーザー単位で独立しており、1 ユーザーの失敗は他に影響しません。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// 累計分数・ストリーク・最終フォーカス日を更新
    async fn credit_focus_minutes(
        &self,
        user_id: &UserId,
        minutes: u32,
        today: NaiveDate,
    ) -> Result<UserFocusStats, RepositoryError>;

    /// 指定日のヒートマップにカテゴリ付きで分数を加算
    async fn add_heatmap_minutes(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        category: &str,
        minutes: u32,
    ) -> Result<HeatmapEntry, RepositoryError>;

    /// 統計を取得（未登録なら 0 の統計）
    async fn get_stats(&self, user_id: &UserId) -> Result<UserFocusStats, RepositoryError>;

    /// 新しい日付順にヒートマップを最大 `limit` 件取得
    async fn get_heatmap(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<HeatmapEntry>, RepositoryError>;

    /// セッションクレジットの冪等キーを登録
    ///
    /// 初めてのキーなら `true`、同じルームで既に使われていれば `false`。
    async fn claim_credit_key(&self, room_id: &RoomId, key: &str) -> Result<bool, RepositoryError>;
}
