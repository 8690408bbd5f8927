//! InMemory UserStats Repository 実装
//!
//! ユーザー統計・日別ヒートマップ・セッションクレジットの冪等キーを保持します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::{
    HeatmapEntry, RepositoryError, RoomId, UserFocusStats, UserId, UserStatsRepository,
};

#[derive(Default)]
struct StatsStore {
    stats: HashMap<UserId, UserFocusStats>,
    heatmap: HashMap<(UserId, NaiveDate), HeatmapEntry>,
    credit_keys: HashSet<(RoomId, String)>,
}

/// インメモリ UserStats Repository 実装
#[derive(Default)]
pub struct InMemoryUserStatsRepository {
    store: Mutex<StatsStore>,
}

impl InMemoryUserStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStatsRepository for InMemoryUserStatsRepository {
    async fn credit_focus_minutes(
        &self,
        user_id: &UserId,
        minutes: u32,
        today: NaiveDate,
    ) -> Result<UserFocusStats, RepositoryError> {
        let mut store = self.store.lock().await;
        let stats = store
            .stats
            .entry(user_id.clone())
            .or_insert_with(|| UserFocusStats::empty(user_id.clone()));
        stats.credit(minutes, today);
        Ok(stats.clone())
    }

    async fn add_heatmap_minutes(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        category: &str,
        minutes: u32,
    ) -> Result<HeatmapEntry, RepositoryError> {
        let mut store = self.store.lock().await;
        let entry = store
            .heatmap
            .entry((user_id.clone(), date))
            .or_insert_with(|| HeatmapEntry::empty(user_id.clone(), date));
        entry.add(category, minutes);
        Ok(entry.clone())
    }

    async fn get_stats(&self, user_id: &UserId) -> Result<UserFocusStats, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .stats
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserFocusStats::empty(user_id.clone())))
    }

    async fn get_heatmap(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<HeatmapEntry>, RepositoryError> {
        let store = self.store.lock().await;
        let mut entries: Vec<HeatmapEntry> = store
            .heatmap
            .values()
            .filter(|entry| &entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn claim_credit_key(&self, room_id: &RoomId, key: &str) -> Result<bool, RepositoryError> {
        let mut store = self.store.lock().await;
        Ok(store.credit_keys.insert((room_id.clone(), key.to_string())))
    }
}
