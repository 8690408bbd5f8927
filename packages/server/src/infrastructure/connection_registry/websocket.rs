//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - ルームごとに WebSocket の `UnboundedSender` を管理
//! - イベントを一度だけシリアライズしてルームの全接続に送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 受信側（pusher ループ）が終了したチャネルへの送信は失敗するため、
//! その時点で接続を取り除き、残りの接続に `user_left` を配信します。
//!
//! ロックを保持したまま送信するので、同じルームへの配信は `broadcast` の呼び出し順になります。

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ActiveUser, Connection, ConnectionId, ConnectionRegistry, PusherChannel, RoomEvent,
        RoomId, Timestamp, UserId,
    },
    infrastructure::dto::conversion::encode_event,
};

struct ConnectionEntry {
    user_id: UserId,
    connected_at: Timestamp,
    channel: PusherChannel,
}

type RoomConnections = HashMap<ConnectionId, ConnectionEntry>;

/// WebSocket を使った ConnectionRegistry 実装
///
/// サービス起動時に 1 つ生成して `Arc` で共有し、停止時に `shutdown` します。
/// テストでは独立したインスタンスをいくつでも作れます。
#[derive(Default)]
pub struct WebSocketConnectionRegistry {
    /// Key: room_id, Value: そのルームの接続
    rooms: Mutex<HashMap<RoomId, RoomConnections>>,
}

impl WebSocketConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みのルーム数（空のルームは残らない）
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

fn encode(event: &RoomEvent) -> Option<String> {
    match encode_event(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!("Failed to serialize '{}' event: {}", event.name(), e);
            None
        }
    }
}

/// ルームの全接続へ送信し、届いた数と、送信に失敗して取り除いた接続のユーザーを返す
///
/// ブロードキャストでは一部の送信失敗を許容し、失敗したチャネルだけを取り除きます。
fn deliver(
    room_id: &RoomId,
    connections: &mut RoomConnections,
    payload: &str,
) -> (usize, Vec<UserId>) {
    let mut delivered = 0;
    let mut dead = Vec::new();
    for (connection_id, entry) in connections.iter() {
        if entry.channel.send(payload.to_string()).is_err() {
            tracing::warn!(
                "Connection {} of user '{}' is gone, pruning it from room '{}'",
                connection_id,
                entry.user_id,
                room_id
            );
            dead.push(*connection_id);
        } else {
            delivered += 1;
        }
    }
    let pruned = dead
        .into_iter()
        .filter_map(|connection_id| connections.remove(&connection_id))
        .map(|entry| entry.user_id)
        .collect();
    (delivered, pruned)
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn connect(&self, room_id: &RoomId, connection: Connection) {
        let mut rooms = self.rooms.lock().await;
        rooms.entry(room_id.clone()).or_default().insert(
            connection.id,
            ConnectionEntry {
                user_id: connection.user_id.clone(),
                connected_at: connection.connected_at,
                channel: connection.channel,
            },
        );
        tracing::debug!(
            "Connection {} of user '{}' registered to room '{}'",
            connection.id,
            connection.user_id,
            room_id
        );
    }

    async fn disconnect(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Option<ActiveUser> {
        let mut rooms = self.rooms.lock().await;
        let connections = rooms.get_mut(room_id)?;
        let removed = connections.remove(&connection_id);
        if connections.is_empty() {
            rooms.remove(room_id);
        }
        removed.map(|entry| {
            tracing::debug!(
                "Connection {} of user '{}' unregistered from room '{}'",
                connection_id,
                entry.user_id,
                room_id
            );
            ActiveUser {
                user_id: entry.user_id,
                connected_at: entry.connected_at,
            }
        })
    }

    async fn broadcast(&self, room_id: &RoomId, event: &RoomEvent) -> usize {
        let Some(payload) = encode(event) else {
            return 0;
        };

        let mut rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get_mut(room_id) else {
            return 0;
        };

        let (delivered, pruned) = deliver(room_id, connections, &payload);

        // 刈り取った接続の退出を残りの接続に知らせる。その配信で刈り取られた接続も同様
        let mut departed: VecDeque<UserId> = pruned.into();
        while let Some(user_id) = departed.pop_front() {
            tracing::info!("User '{}' dropped from room '{}'", user_id, room_id);
            let Some(notice) = encode(&RoomEvent::UserLeft { user_id }) else {
                continue;
            };
            let (_, more) = deliver(room_id, connections, &notice);
            departed.extend(more);
        }

        if connections.is_empty() {
            rooms.remove(room_id);
        }

        tracing::debug!(
            "Broadcasted '{}' to {} connection(s) in room '{}'",
            event.name(),
            delivered,
            room_id
        );
        delivered
    }

    async fn active_users(&self, room_id: &RoomId) -> Vec<ActiveUser> {
        let rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get(room_id) else {
            return Vec::new();
        };

        let mut earliest: HashMap<&UserId, Timestamp> = HashMap::new();
        for entry in connections.values() {
            earliest
                .entry(&entry.user_id)
                .and_modify(|t| *t = (*t).min(entry.connected_at))
                .or_insert(entry.connected_at);
        }

        let mut users: Vec<ActiveUser> = earliest
            .into_iter()
            .map(|(user_id, connected_at)| ActiveUser {
                user_id: user_id.clone(),
                connected_at,
            })
            .collect();
        users.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users
    }

    async fn connection_count(&self, room_id: &RoomId) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map_or(0, HashMap::len)
    }

    async fn close_room(&self, room_id: &RoomId) -> usize {
        let mut rooms = self.rooms.lock().await;
        // sender を drop すると各接続の pusher ループが終了する
        rooms.remove(room_id).map_or(0, |connections| connections.len())
    }

    async fn shutdown(&self) {
        let mut rooms = self.rooms.lock().await;
        let total: usize = rooms.values().map(HashMap::len).sum();
        rooms.clear();
        tracing::info!("Connection registry shut down, closed {} connection(s)", total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomUpdateTrigger;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - connect / disconnect 後の集合が「接続して、まだ切断も送信失敗もしていない接続」と一致すること
    // - broadcast が全接続に届き、死んだチャネルだけが取り除かれること
    // - 空になったルームのエントリが残らないこと
    // ========================================

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn connection(user: &str, connected_at: i64) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Connection {
                id: ConnectionId::generate(),
                user_id: UserId::new(user.to_string()).unwrap(),
                connected_at: Timestamp::new(connected_at),
                channel: tx,
            },
            rx,
        )
    }

    fn room_update() -> RoomEvent {
        RoomEvent::RoomUpdate {
            trigger: RoomUpdateTrigger::MemberApproved,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection_in_room() {
        // テスト項目: ルームの全接続にイベントが届き、他のルームには届かない
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        let (bob, mut bob_rx) = connection("bob", 2);
        let (carol, mut carol_rx) = connection("carol", 3);
        registry.connect(&room("r1"), alice).await;
        registry.connect(&room("r1"), bob).await;
        registry.connect(&room("r2"), carol).await;

        // when (操作):
        let delivered = registry.broadcast(&room("r1"), &room_update()).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        let expected = r#"{"type":"room_update","trigger":"member_approved"}"#;
        assert_eq!(alice_rx.recv().await.as_deref(), Some(expected));
        assert_eq!(bob_rx.recv().await.as_deref(), Some(expected));
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_prunes_dead_channel_and_keeps_others() {
        // テスト項目: 受信側が消えた接続は取り除かれ、他の接続への配信は続く
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        let (bob, bob_rx) = connection("bob", 2);
        registry.connect(&room("r1"), alice).await;
        registry.connect(&room("r1"), bob).await;
        drop(bob_rx);

        // when (操作):
        let delivered = registry.broadcast(&room("r1"), &room_update()).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(alice_rx.recv().await.is_some());
        assert_eq!(registry.connection_count(&room("r1")).await, 1);
        let active = registry.active_users(&room("r1")).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_pruned_connection_is_announced_as_departure() {
        // テスト項目: 送信失敗で取り除かれた接続の user_left が、元のイベントの後に残りの接続へ届く
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        let (bob, bob_rx) = connection("bob", 2);
        registry.connect(&room("r1"), alice).await;
        registry.connect(&room("r1"), bob).await;
        drop(bob_rx);

        // when (操作):
        registry.broadcast(&room("r1"), &room_update()).await;

        // then (期待する結果):
        assert_eq!(
            alice_rx.recv().await.as_deref(),
            Some(r#"{"type":"room_update","trigger":"member_approved"}"#)
        );
        assert_eq!(
            alice_rx.recv().await.as_deref(),
            Some(r#"{"type":"user_left","userId":"bob"}"#)
        );
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_departure_notice_prunes_further_dead_connections() {
        // テスト項目: user_left の配信で見つかった死んだ接続も取り除かれ、退出が知らされる
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        let (bob, bob_rx) = connection("bob", 2);
        let (carol, carol_rx) = connection("carol", 3);
        registry.connect(&room("r1"), alice).await;
        registry.connect(&room("r1"), bob).await;
        registry.connect(&room("r1"), carol).await;
        drop(bob_rx);
        drop(carol_rx);

        // when (操作):
        let delivered = registry.broadcast(&room("r1"), &room_update()).await;

        // then (期待する結果): alice だけが残り、2 人分の退出を受け取る
        assert_eq!(delivered, 1);
        assert_eq!(registry.connection_count(&room("r1")).await, 1);
        let mut received = Vec::new();
        while let Ok(text) = alice_rx.try_recv() {
            received.push(text);
        }
        assert_eq!(received.len(), 3);
        let mut departed: Vec<&str> = received[1..]
            .iter()
            .map(|text| {
                if text.contains(r#""userId":"bob""#) {
                    "bob"
                } else {
                    "carol"
                }
            })
            .collect();
        departed.sort_unstable();
        assert_eq!(departed, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_room_entry_is_removed_when_every_connection_is_pruned() {
        // テスト項目: 全接続が送信失敗で取り除かれるとルームのエントリも消える
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (bob, bob_rx) = connection("bob", 2);
        registry.connect(&room("r1"), bob).await;
        drop(bob_rx);

        // when (操作):
        let delivered = registry.broadcast(&room("r1"), &room_update()).await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_preserves_call_order() {
        // テスト項目: 同じルームへの配信は呼び出し順に届く
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        registry.connect(&room("r1"), alice).await;

        // when (操作):
        for n in 0..3 {
            registry
                .broadcast(
                    &room("r1"),
                    &RoomEvent::Passthrough(serde_json::json!({"type":"tick","n":n})),
                )
                .await;
        }

        // then (期待する結果):
        for n in 0..3 {
            let text = alice_rx.recv().await.unwrap();
            assert_eq!(text, format!(r#"{{"n":{n},"type":"tick"}}"#));
        }
    }

    #[tokio::test]
    async fn test_disconnect_removes_empty_room_entry() {
        // テスト項目: 最後の接続が切断されるとルームのエントリが消える
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, _alice_rx) = connection("alice", 1);
        let alice_id = alice.id;
        registry.connect(&room("r1"), alice).await;

        // when (操作):
        let removed = registry.disconnect(&room("r1"), alice_id).await;
        let removed_again = registry.disconnect(&room("r1"), alice_id).await;

        // then (期待する結果):
        assert_eq!(removed.unwrap().user_id.as_str(), "alice");
        assert_eq!(removed_again, None);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_live_set_matches_connect_disconnect_sequence() {
        // テスト項目: connect / disconnect の任意の順序の後、集合は残っている接続と一致する
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for (n, user) in ["u0", "u1", "u2", "u3", "u4"].iter().enumerate() {
            let (conn, rx) = connection(user, n as i64);
            ids.push(conn.id);
            receivers.push(rx);
            registry.connect(&room("r1"), conn).await;
        }

        // when (操作): u1 と u3 を切断
        registry.disconnect(&room("r1"), ids[1]).await;
        registry.disconnect(&room("r1"), ids[3]).await;

        // then (期待する結果):
        let users: Vec<String> = registry
            .active_users(&room("r1"))
            .await
            .into_iter()
            .map(|u| u.user_id.into_string())
            .collect();
        assert_eq!(users, vec!["u0", "u2", "u4"]);
    }

    #[tokio::test]
    async fn test_active_users_deduplicates_same_user() {
        // テスト項目: 同じユーザーの複数接続は最初の接続時刻で 1 件にまとめられる
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (first_tab, _rx1) = connection("alice", 10);
        let (second_tab, _rx2) = connection("alice", 5);
        registry.connect(&room("r1"), first_tab).await;
        registry.connect(&room("r1"), second_tab).await;

        // when (操作):
        let active = registry.active_users(&room("r1")).await;

        // then (期待する結果):
        assert_eq!(registry.connection_count(&room("r1")).await, 2);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].connected_at, Timestamp::new(5));
    }

    #[tokio::test]
    async fn test_close_room_and_shutdown_drop_senders() {
        // テスト項目: close_room / shutdown で sender が破棄され、受信側が終了する
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (alice, mut alice_rx) = connection("alice", 1);
        let (bob, mut bob_rx) = connection("bob", 1);
        registry.connect(&room("r1"), alice).await;
        registry.connect(&room("r2"), bob).await;

        // when (操作):
        let closed = registry.close_room(&room("r1")).await;
        registry.shutdown().await;

        // then (期待する結果):
        assert_eq!(closed, 1);
        assert_eq!(alice_rx.recv().await, None);
        assert_eq!(bob_rx.recv().await, None);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_is_noop() {
        // テスト項目: 接続のないルームへの配信は 0 件で終わる
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();

        // when / then:
        assert_eq!(registry.broadcast(&room("nobody"), &room_update()).await, 0);
    }
}
