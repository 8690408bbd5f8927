//! ルームタイマーの状態機械
//!
//! 1 ルームにタイマーは 1 つだけ。状態は stopped / running / paused の 3 つで、
//! 各状態で `started_at` と `duration_minutes` の意味が変わります。
//!
//! - running: `started_at` あり、`duration_minutes` は設定された全体の長さ
//! - paused: `started_at` なし、`duration_minutes` は一時停止時点の残り分数
//! - stopped: `started_at` なし、`duration_minutes` は次回開始時のデフォルト
//!
//! 残り時間の表示はクライアントが `started_at` と `duration_minutes` から計算します。

use std::{fmt, str::FromStr};

use super::value_object::Timestamp;

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Stopped => "stopped",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// タイマー状態（ルームドキュメントに埋め込まれる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub status: TimerStatus,
    pub duration_minutes: u32,
    pub started_at: Option<Timestamp>,
}

/// タイマー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// `None` または 0 の場合は前回設定（または一時停止時の残り）の分数で開始
    Start { duration_minutes: Option<u32> },
    Pause,
    Stop,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timer action '{0}' (expected start, stop, pause or reset)")]
pub struct UnknownTimerAction(pub String);

impl TimerCommand {
    /// HTTP の `action` パラメータからコマンドを組み立てる
    pub fn from_action(
        action: &str,
        duration_minutes: Option<u32>,
    ) -> Result<Self, UnknownTimerAction> {
        let command = match action.parse::<TimerAction>()? {
            TimerAction::Start => TimerCommand::Start { duration_minutes },
            TimerAction::Pause => TimerCommand::Pause,
            TimerAction::Stop => TimerCommand::Stop,
            TimerAction::Reset => TimerCommand::Reset,
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    Start,
    Pause,
    Stop,
    Reset,
}

impl FromStr for TimerAction {
    type Err = UnknownTimerAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(TimerAction::Start),
            "pause" => Ok(TimerAction::Pause),
            "stop" => Ok(TimerAction::Stop),
            "reset" => Ok(TimerAction::Reset),
            other => Err(UnknownTimerAction(other.to_string())),
        }
    }
}

impl TimerState {
    /// 停止状態のタイマーを作成
    pub fn stopped(duration_minutes: u32) -> Self {
        Self {
            status: TimerStatus::Stopped,
            duration_minutes,
            started_at: None,
        }
    }

    /// コマンドを適用した次の状態を返す
    ///
    /// 状態が変わらないコマンド（running 以外での pause）は `None` を返します。
    /// `fallback_minutes` は保持している分数が 0 の状態で引数なし start された場合に使います。
    pub fn apply(
        &self,
        command: TimerCommand,
        now: Timestamp,
        fallback_minutes: u32,
    ) -> Option<Self> {
        match command {
            TimerCommand::Start { duration_minutes } => {
                Some(self.start(duration_minutes, now, fallback_minutes))
            }
            TimerCommand::Pause => self.pause(now),
            TimerCommand::Stop | TimerCommand::Reset => Some(self.stop()),
        }
    }

    /// 0 分の指定は「指定なし」として扱う
    pub fn start(
        &self,
        duration_minutes: Option<u32>,
        now: Timestamp,
        fallback_minutes: u32,
    ) -> Self {
        let duration_minutes = match duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ if self.duration_minutes > 0 => self.duration_minutes,
            _ => fallback_minutes,
        };
        Self {
            status: TimerStatus::Running,
            duration_minutes,
            started_at: Some(now),
        }
    }

    /// running からのみ有効。残り分数（切り捨て）を保持して paused へ
    pub fn pause(&self, now: Timestamp) -> Option<Self> {
        if self.status != TimerStatus::Running {
            return None;
        }
        let started_at = self.started_at?;
        Some(Self {
            status: TimerStatus::Paused,
            duration_minutes: self.remaining_minutes_at(started_at, now),
            started_at: None,
        })
    }

    /// 分数は次回 start のデフォルトとして残す
    pub fn stop(&self) -> Self {
        Self {
            status: TimerStatus::Stopped,
            duration_minutes: self.duration_minutes,
            started_at: None,
        }
    }

    /// 現時点の残り分数（切り捨て）
    pub fn remaining_minutes(&self, now: Timestamp) -> u32 {
        match (self.status, self.started_at) {
            (TimerStatus::Running, Some(started_at)) => self.remaining_minutes_at(started_at, now),
            _ => self.duration_minutes,
        }
    }

    fn remaining_minutes_at(&self, started_at: Timestamp, now: Timestamp) -> u32 {
        let total_millis = i64::from(self.duration_minutes) * MILLIS_PER_MINUTE;
        let remaining_millis = total_millis - now.millis_since(started_at);
        if remaining_millis <= 0 {
            0
        } else {
            u32::try_from(remaining_millis / MILLIS_PER_MINUTE).unwrap_or(u32::MAX)
        }
    }
}
