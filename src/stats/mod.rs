pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use evaluator::{lifetime_badges, scan_participations, LifetimeStats, Participation};
pub use models::{achievements, LeaderboardEntry, UserRecord};
pub use repository::{InMemoryStatsRepository, StatsRepository};
pub use service::ProfileService;
