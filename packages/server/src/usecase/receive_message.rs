//! UseCase: WebSocket からのメッセージ受信
//!
//! - `chat_message`: サーバー時刻を付けて履歴に保存し、送信者を含むルーム全体に配信
//! - `timer_start`: タイマー操作のユースケースに委譲（HTTP の start と同じ遷移）
//! - その他: `timestamp` を付けてそのまま配信

use std::sync::Arc;

use focusroom_shared::time::{Clock, timestamp_to_rfc3339};
use serde_json::Value;

use crate::domain::{
    ChatMessage, ConnectionRegistry, DisplayName, InboundMessage, MessageContent, MessageId,
    RoomEvent, RoomId, RoomPolicy, RoomRepository, TimerCommand, Timestamp, UserIdentity,
};

use super::{control_timer::ControlTimerUseCase, error::RoomError};

/// メッセージ受信のユースケース
pub struct ReceiveMessageUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    control_timer: Arc<ControlTimerUseCase>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl ReceiveMessageUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        control_timer: Arc<ControlTimerUseCase>,
        clock: Arc<dyn Clock>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            repository,
            registry,
            control_timer,
            clock,
            policy,
        }
    }

    /// 受信したメッセージをルームに適用する
    ///
    /// # Arguments
    ///
    /// * `room_id` - 接続先のルーム
    /// * `sender` - 接続時に確定したユーザー（ペイロードの userId は使わない）
    /// * `message` - パース済みのメッセージ
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: &UserIdentity,
        message: InboundMessage,
    ) -> Result<(), RoomError> {
        let now = Timestamp::new(self.clock.now_millis());
        match message {
            InboundMessage::Chat {
                id,
                user_name,
                content,
            } => {
                let message = ChatMessage {
                    id: match id {
                        Some(id) => MessageId::new(id).unwrap_or_else(|_| MessageId::generate()),
                        None => MessageId::generate(),
                    },
                    user_id: sender.user_id.clone(),
                    user_name: user_name
                        .and_then(|name| DisplayName::new(name).ok())
                        .unwrap_or_else(|| sender.display_name.clone()),
                    content: MessageContent::new(content)?,
                    timestamp: now,
                };
                self.repository
                    .add_chat_message(room_id, message.clone(), self.policy.chat_history_limit)
                    .await?;
                tracing::debug!("Chat message {} stored in room '{}'", message.id, room_id);
                self.registry
                    .broadcast(room_id, &RoomEvent::Chat(message))
                    .await;
            }
            InboundMessage::TimerStart { duration_minutes } => {
                self.control_timer
                    .execute(room_id, &sender.user_id, TimerCommand::Start { duration_minutes })
                    .await?;
            }
            InboundMessage::Unknown(mut raw) => {
                if let Value::Object(fields) = &mut raw {
                    fields.insert(
                        "timestamp".to_string(),
                        Value::String(timestamp_to_rfc3339(now.value())),
                    );
                }
                self.registry
                    .broadcast(room_id, &RoomEvent::Passthrough(raw))
                    .await;
            }
        }
        Ok(())
    }
}
