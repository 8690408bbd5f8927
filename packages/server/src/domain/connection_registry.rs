//! ConnectionRegistry trait 定義
//!
//! ルーム ID → 生きている双方向チャネルの集合。純粋なファンアウトのみを担い、
//! ビジネスロジックは持ちません。
//!
//! ## 配信の保証
//!
//! - 同じルーム内では `broadcast` が呼ばれた順に配信される
//! - ルームをまたいだ順序は保証しない
//! - 送信に失敗したチャネル（相手が消えた）はその場で取り除き、他の配信は続ける
//! - 取り除いたチャネルのユーザーについては、残りの接続に `user_left` を配信する

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, RoomEvent, RoomId, Timestamp, UserId};

/// クライアントへ送る JSON 文字列のチャネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 登録する 1 本の接続
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub connected_at: Timestamp,
    pub channel: PusherChannel,
}

/// ライブ接続から導かれるプレゼンス（永続化しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUser {
    pub user_id: UserId,
    pub connected_at: Timestamp,
}

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// ルームに接続を登録（ルームの集合がなければ作る）
    async fn connect(&self, room_id: &RoomId, connection: Connection);

    /// 接続を取り除く。集合が空になったルームのエントリは削除する
    async fn disconnect(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Option<ActiveUser>;

    /// ルームの全接続へ配信し、届いた接続数を返す
    ///
    /// 送信に失敗した接続は取り除かれ、その退出が残りの接続に配信されます。
    async fn broadcast(&self, room_id: &RoomId, event: &RoomEvent) -> usize;

    /// ルームに接続中のユーザー（同一ユーザーの複数接続は 1 件にまとめる）
    async fn active_users(&self, room_id: &RoomId) -> Vec<ActiveUser>;

    /// ルームの接続数
    async fn connection_count(&self, room_id: &RoomId) -> usize;

    /// ルームの全接続を閉じ、閉じた数を返す
    async fn close_room(&self, room_id: &RoomId) -> usize;

    /// 全ルームの全接続を閉じる（サーバー停止時）
    async fn shutdown(&self);
}
