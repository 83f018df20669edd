use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluator::ExactHitDetail;

/// Full profile for one user, recomputed on demand from the history of
/// closed pools plus the persisted lifetime counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub display_name: String,
    pub pools_played: u32,
    pub total_wins: u32,
    pub total_points: u64,
    pub total_exact_hits: u32,
    pub best_win_streak: u32,
    pub last_place_finishes: u32,
    pub achievements: Vec<String>,
    /// Exact hits, newest first.
    pub exact_hits: Vec<ExactHitDetail>,
}

/// One row of the global leaderboard view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub display_name: String,
    pub total_wins: u32,
    pub last_win_at: Option<DateTime<Utc>>,
    pub rank: u32,
}

/// Admin override for a user's win count.
#[derive(Debug, Deserialize)]
pub struct SetWinsRequest {
    pub total_wins: u32,
}
