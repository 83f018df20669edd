use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::evaluator::{lifetime_badges, scan_participations, Participation};
use super::repository::StatsRepository;
use super::types::{LeaderboardRow, ProfileResponse};
use crate::pool::repository::PoolRepository;
use crate::scoring::assign_ranks;
use crate::shared::AppError;

/// Computes user profiles and the global leaderboard view.
///
/// Profile computation is also the point where lifetime-scan badges are
/// unlocked and persisted; pool-scoped badges are unlocked by the close
/// transaction instead.
pub struct ProfileService {
    pool_repository: Arc<dyn PoolRepository>,
    stats_repository: Arc<dyn StatsRepository>,
}

impl ProfileService {
    pub fn new(
        pool_repository: Arc<dyn PoolRepository>,
        stats_repository: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            pool_repository,
            stats_repository,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> Result<ProfileResponse, AppError> {
        let record = self
            .stats_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        let leaderboard_entry = self.stats_repository.get_leaderboard_entry(user_id).await?;
        let total_wins = leaderboard_entry.map(|e| e.total_wins).unwrap_or(0);

        // Participations come back oldest first, which is the order the
        // streak scan needs.
        let participations: Vec<Participation> = self
            .pool_repository
            .list_participations(user_id)
            .await?
            .into_iter()
            .map(|(pool, prediction)| Participation { pool, prediction })
            .collect();

        let stats = scan_participations(user_id, &participations);
        let earned = lifetime_badges(&stats, record.total_points, total_wins);
        let newly_unlocked = self
            .stats_repository
            .unlock_achievements(user_id, &earned)
            .await?;
        if !newly_unlocked.is_empty() {
            info!(
                user_id = %user_id,
                badges = ?newly_unlocked,
                "Unlocked lifetime badges on profile view"
            );
        }

        let mut achievements: Vec<String> = record.achievements.iter().cloned().collect();
        for badge in newly_unlocked {
            if !achievements.contains(&badge) {
                achievements.push(badge);
            }
        }

        let mut exact_hits = stats.exact_hits.clone();
        exact_hits.reverse();

        debug!(
            user_id = %user_id,
            pools_played = stats.pools_played,
            exact_hits = stats.total_exact_hits,
            "Profile computed"
        );

        Ok(ProfileResponse {
            user_id: record.user_id,
            display_name: record.display_name,
            pools_played: stats.pools_played,
            total_wins,
            total_points: record.total_points,
            total_exact_hits: stats.total_exact_hits,
            best_win_streak: stats.displayed_win_streak(),
            last_place_finishes: record.last_place_finishes,
            achievements,
            exact_hits,
        })
    }

    /// Every known user joined with their leaderboard wins, most wins
    /// first, with competition ranking.
    #[instrument(skip(self))]
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, AppError> {
        let users = self.stats_repository.list_users().await?;
        let entries = self.stats_repository.list_leaderboard().await?;
        let wins: std::collections::HashMap<String, (u32, Option<chrono::DateTime<chrono::Utc>>)> =
            entries
                .into_iter()
                .map(|e| (e.user_id.clone(), (e.total_wins, e.last_win_at)))
                .collect();

        let mut rows: Vec<LeaderboardRow> = users
            .into_iter()
            .map(|user| {
                let (total_wins, last_win_at) =
                    wins.get(&user.user_id).copied().unwrap_or((0, None));
                LeaderboardRow {
                    user_id: user.user_id,
                    display_name: user.display_name,
                    total_wins,
                    last_win_at,
                    rank: 0,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_wins
                .cmp(&a.total_wins)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        assign_ranks(&mut rows, |row| row.total_wins, |row, rank| row.rank = rank);
        Ok(rows)
    }
}
