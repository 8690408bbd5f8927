mod room;
mod user_stats;

pub use room::InMemoryRoomRepository;
pub use user_stats::InMemoryUserStatsRepository;
