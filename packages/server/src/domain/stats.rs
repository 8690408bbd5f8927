//! フォーカス統計（累計分数・ストリーク・日別ヒートマップ）

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use super::value_object::UserId;

/// ルームセッションのクレジットに使うカテゴリ
pub const ROOM_SESSION_CATEGORY: &str = "Study";

/// ユーザーごとのフォーカス統計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFocusStats {
    pub user_id: UserId,
    pub total_focus_minutes: u64,
    pub streak_count: u32,
    pub last_focus_date: Option<NaiveDate>,
}

impl UserFocusStats {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_focus_minutes: 0,
            streak_count: 0,
            last_focus_date: None,
        }
    }

    /// フォーカス分数を加算し、ストリークと最終フォーカス日を更新
    ///
    /// - 最終日が昨日: ストリーク +1
    /// - 最終日が今日: ストリークはそのまま
    /// - それ以外: ストリークを 1 からやり直す
    pub fn credit(&mut self, minutes: u32, today: NaiveDate) {
        let yesterday = today.checked_sub_days(Days::new(1));
        self.streak_count = match self.last_focus_date {
            Some(last) if last == today => self.streak_count.max(1),
            Some(last) if Some(last) == yesterday => self.streak_count.saturating_add(1),
            _ => 1,
        };
        self.total_focus_minutes = self.total_focus_minutes.saturating_add(u64::from(minutes));
        self.last_focus_date = Some(today);
    }
}

/// 1 ユーザー・1 日分のヒートマップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapEntry {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub total_minutes: u64,
    pub category_breakdown: BTreeMap<String, u64>,
}

impl HeatmapEntry {
    pub fn empty(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            total_minutes: 0,
            category_breakdown: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, category: &str, minutes: u32) {
        let minutes = u64::from(minutes);
        self.total_minutes = self.total_minutes.saturating_add(minutes);
        *self
            .category_breakdown
            .entry(category.to_string())
            .or_insert(0) += minutes;
    }
}
