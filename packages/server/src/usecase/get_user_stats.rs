//! UseCase: 個人統計の取得

use std::sync::Arc;

use crate::domain::{HeatmapEntry, UserFocusStats, UserId, UserStatsRepository};

use super::error::RoomError;

/// ヒートマップとして返す日数
pub const HEATMAP_DAYS: usize = 365;

/// 累計分数・ストリークの取得
pub struct GetUserStatsUseCase {
    repository: Arc<dyn UserStatsRepository>,
}

impl GetUserStatsUseCase {
    pub fn new(repository: Arc<dyn UserStatsRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, user_id: &UserId) -> Result<UserFocusStats, RoomError> {
        Ok(self.repository.get_stats(user_id).await?)
    }
}

/// 直近のヒートマップの取得（新しい日付順）
pub struct GetUserHeatmapUseCase {
    repository: Arc<dyn UserStatsRepository>,
}

impl GetUserHeatmapUseCase {
    pub fn new(repository: Arc<dyn UserStatsRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, user_id: &UserId) -> Result<Vec<HeatmapEntry>, RoomError> {
        Ok(self.repository.get_heatmap(user_id, HEATMAP_DAYS).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::repository::InMemoryUserStatsRepository,
        usecase::test_support::user_id,
    };
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_unknown_user_has_zero_stats() {
        // テスト項目: 一度も記録のないユーザーは 0 の統計と空のヒートマップ
        // given (前提条件):
        let repository = Arc::new(InMemoryUserStatsRepository::new());

        // when (操作):
        let stats = GetUserStatsUseCase::new(repository.clone())
            .execute(&user_id("nobody"))
            .await
            .unwrap();
        let heatmap = GetUserHeatmapUseCase::new(repository)
            .execute(&user_id("nobody"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(stats.total_focus_minutes, 0);
        assert_eq!(stats.streak_count, 0);
        assert!(heatmap.is_empty());
    }

    #[tokio::test]
    async fn test_heatmap_returns_newest_days_first() {
        // テスト項目: ヒートマップは新しい日付順
        // given (前提条件):
        let repository = Arc::new(InMemoryUserStatsRepository::new());
        let alice = user_id("alice");
        for day in [3, 1, 2] {
            let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
            repository
                .add_heatmap_minutes(&alice, date, "Study", 10)
                .await
                .unwrap();
        }

        // when (操作):
        let heatmap = GetUserHeatmapUseCase::new(repository)
            .execute(&alice)
            .await
            .unwrap();

        // then (期待する結果):
        let days: Vec<u32> = heatmap.iter().map(|e| chrono::Datelike::day(&e.date)).collect();
        assert_eq!(days, vec![3, 2, 1]);
    }
}
