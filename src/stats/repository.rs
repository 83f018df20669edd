use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::models::{LeaderboardEntry, UserRecord};
use crate::lifecycle::effects::{CloseEffects, UserDelta};
use crate::pool::models::WinnerEntry;
use crate::shared::AppError;

/// Trait for user lifetime counters and the global leaderboard.
///
/// `apply_close_effects` and `revert_close_effects` are all-or-nothing:
/// a store-backed implementation must run them inside one transaction so
/// counters can never drift from the pool's closed flag under concurrent
/// closes. The in-memory implementation holds a single write lock across
/// the whole mutation.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, AppError>;
    async fn get_users(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, UserRecord>, AppError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError>;
    /// Creates a blank record for a user if none exists yet.
    async fn register_user(&self, user_id: &str, display_name: &str) -> Result<(), AppError>;

    async fn get_leaderboard_entry(
        &self,
        user_id: &str,
    ) -> Result<Option<LeaderboardEntry>, AppError>;
    async fn list_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, AppError>;
    /// Admin override: sets an absolute win count.
    async fn set_total_wins(
        &self,
        user_id: &str,
        display_name: &str,
        total_wins: u32,
    ) -> Result<(), AppError>;

    /// Applies a pool closure: lifetime points, last-place counts,
    /// pool-scoped badges and winner leaderboard increments.
    async fn apply_close_effects(&self, effects: &CloseEffects) -> Result<(), AppError>;
    /// Exactly reverses the counter side of a closure. Badges are left
    /// in place: achievements are never revoked.
    async fn revert_close_effects(
        &self,
        deltas: &[UserDelta],
        winners: &[WinnerEntry],
    ) -> Result<(), AppError>;

    /// Adds badges to a user's achievement set, returning the ones that
    /// were actually new.
    async fn unlock_achievements(
        &self,
        user_id: &str,
        badges: &[String],
    ) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, Default)]
struct StatsState {
    users: HashMap<String, UserRecord>,
    leaderboard: HashMap<String, LeaderboardEntry>,
}

/// In-memory implementation of StatsRepository for development and
/// testing. One lock guards users and leaderboard together so close and
/// reopen effects apply atomically.
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    state: RwLock<StatsState>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StatsState::default()),
        }
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).cloned())
    }

    #[instrument(skip(self, user_ids))]
    async fn get_users(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, UserRecord>, AppError> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<UserRecord> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn register_user(&self, user_id: &str, display_name: &str) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id.to_string(), display_name.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_leaderboard_entry(
        &self,
        user_id: &str,
    ) -> Result<Option<LeaderboardEntry>, AppError> {
        let state = self.state.read().await;
        Ok(state.leaderboard.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let state = self.state.read().await;
        Ok(state.leaderboard.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn set_total_wins(
        &self,
        user_id: &str,
        display_name: &str,
        total_wins: u32,
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let entry = state
            .leaderboard
            .entry(user_id.to_string())
            .or_insert_with(|| {
                LeaderboardEntry::new(user_id.to_string(), display_name.to_string())
            });
        entry.total_wins = total_wins;
        Ok(())
    }

    #[instrument(skip(self, effects), fields(pool_id = %effects.pool_id))]
    async fn apply_close_effects(&self, effects: &CloseEffects) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        for delta in &effects.deltas {
            let record = state
                .users
                .entry(delta.user_id.clone())
                .or_insert_with(|| {
                    UserRecord::new(delta.user_id.clone(), delta.display_name.clone())
                });
            record.total_points += u64::from(delta.points);
            if delta.last_place {
                record.last_place_finishes += 1;
            }
            record.achievements.extend(delta.unlock.iter().cloned());
        }

        let now = Utc::now();
        for winner in &effects.winners {
            let entry = state
                .leaderboard
                .entry(winner.user_id.clone())
                .or_insert_with(|| {
                    LeaderboardEntry::new(winner.user_id.clone(), winner.display_name.clone())
                });
            entry.total_wins += 1;
            entry.last_win_at = Some(now);
        }

        debug!(
            scored_users = effects.deltas.len(),
            winners = effects.winners.len(),
            "Applied close effects"
        );
        Ok(())
    }

    #[instrument(skip(self, deltas, winners))]
    async fn revert_close_effects(
        &self,
        deltas: &[UserDelta],
        winners: &[WinnerEntry],
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        for delta in deltas {
            if let Some(record) = state.users.get_mut(&delta.user_id) {
                record.total_points = record.total_points.saturating_sub(u64::from(delta.points));
                if delta.last_place {
                    record.last_place_finishes = record.last_place_finishes.saturating_sub(1);
                }
            }
        }

        for winner in winners {
            if let Some(entry) = state.leaderboard.get_mut(&winner.user_id) {
                entry.total_wins = entry.total_wins.saturating_sub(1);
            }
        }

        debug!(
            scored_users = deltas.len(),
            winners = winners.len(),
            "Reverted close effects"
        );
        Ok(())
    }

    #[instrument(skip(self, badges))]
    async fn unlock_achievements(
        &self,
        user_id: &str,
        badges: &[String],
    ) -> Result<Vec<String>, AppError> {
        let mut state = self.state.write().await;
        let record = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        let mut added = Vec::new();
        for badge in badges {
            if record.achievements.insert(badge.clone()) {
                added.push(badge.clone());
            }
        }
        Ok(added)
    }
}
