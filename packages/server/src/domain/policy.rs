//! ルーム運用ポリシー（起動時の設定から組み立てる）

/// タイマー操作を誰に許可するか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerControlPolicy {
    /// ルームのオーナーのみ
    OwnerOnly,
    /// members に含まれるユーザーなら誰でも
    #[default]
    AnyMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    pub timer_control: TimerControlPolicy,
    /// 作成からルームが失効するまでの時間
    pub room_ttl_millis: i64,
    pub default_timer_minutes: u32,
    pub chat_history_limit: usize,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            timer_control: TimerControlPolicy::default(),
            room_ttl_millis: 24 * 60 * 60 * 1000,
            default_timer_minutes: 25,
            chat_history_limit: 500,
        }
    }
}
