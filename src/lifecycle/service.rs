use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{error, info, instrument};

use super::effects::{build_close_effects, build_reopen_deltas, CloseEffects};
use super::errors::LifecycleError;
use crate::pool::models::{Pool, WinnerEntry};
use crate::pool::repository::PoolRepository;
use crate::scoring::{compute_standings, PredictionEntry, Standing};
use crate::stats::repository::StatsRepository;

/// Outcome of closing a pool, returned to the admin caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseOutcome {
    pub pool_id: String,
    pub winners: Vec<WinnerEntry>,
    pub max_score: u32,
    pub standings: Vec<Standing>,
}

/// Drives pool transitions between Open, Locked and Closed, including
/// the reversible side effects on lifetime counters and the leaderboard.
///
/// Close, reopen and delete all read pool state and write derived
/// aggregates, so they are serialized per pool: two concurrent closes of
/// the same pool must not double-apply counter increments, and a delete
/// must not slip between a close's counter writes and its flag flip.
pub struct LifecycleService {
    pool_repository: Arc<dyn PoolRepository>,
    stats_repository: Arc<dyn StatsRepository>,
    pool_mutexes: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LifecycleService {
    pub fn new(
        pool_repository: Arc<dyn PoolRepository>,
        stats_repository: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            pool_repository,
            stats_repository,
            pool_mutexes: RwLock::new(HashMap::new()),
        }
    }

    async fn pool_lock(&self, pool_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let locks = self.pool_mutexes.read().await;
            if let Some(lock) = locks.get(pool_id) {
                return Arc::clone(lock);
            }
        }
        let mut locks = self.pool_mutexes.write().await;
        Arc::clone(
            locks
                .entry(pool_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    #[instrument(skip(self))]
    pub async fn set_active(&self, pool_id: &str, value: bool) -> Result<(), LifecycleError> {
        // Activation is independent per pool; other pools keep their flag.
        self.pool_repository.set_active(pool_id, value).await?;
        info!(pool_id = %pool_id, active = value, "Pool activation flag changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_locked(&self, pool_id: &str, value: bool) -> Result<(), LifecycleError> {
        self.pool_repository.set_locked(pool_id, value).await?;
        info!(pool_id = %pool_id, locked = value, "Pool lock flag changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_results_visible(
        &self,
        pool_id: &str,
        value: bool,
    ) -> Result<(), LifecycleError> {
        self.pool_repository
            .set_results_visible(pool_id, value)
            .await?;
        info!(pool_id = %pool_id, results_visible = value, "Pool results visibility changed");
        Ok(())
    }

    /// Deletes a pool together with its predictions. Closed pools must
    /// be reopened first so their counter effects are reverted before
    /// the winners snapshot disappears.
    #[instrument(skip(self))]
    pub async fn delete(&self, pool_id: &str) -> Result<(), LifecycleError> {
        let pool_lock = self.pool_lock(pool_id).await;
        let _guard = pool_lock.lock().await;

        let pool = self.get_pool(pool_id).await?;
        if pool.is_closed {
            return Err(LifecycleError::DeleteClosed);
        }
        self.pool_repository.delete_pool(pool_id).await?;
        info!(pool_id = %pool_id, "Pool deleted");
        Ok(())
    }

    /// Closes a pool: computes final standings, persists the winners
    /// snapshot and applies all counter mutations.
    #[instrument(skip(self))]
    pub async fn close(&self, pool_id: &str) -> Result<CloseOutcome, LifecycleError> {
        let pool_lock = self.pool_lock(pool_id).await;
        let _guard = pool_lock.lock().await;

        let pool = self.get_pool(pool_id).await?;
        if pool.is_closed {
            return Err(LifecycleError::AlreadyClosed);
        }
        let total = pool.matches.len();
        let missing = pool
            .matches
            .iter()
            .filter(|m| !pool.real_results.contains_key(&m.id))
            .count();
        if missing > 0 {
            return Err(LifecycleError::ResultsIncomplete { missing, total });
        }

        let standings = self.current_standings(&pool).await?;

        if standings.is_empty() {
            // Nothing to score: close with an empty winners snapshot and
            // leave every counter untouched.
            self.pool_repository.mark_closed(pool_id, vec![]).await?;
            info!(pool_id = %pool_id, "Pool closed without predictions");
            return Ok(CloseOutcome {
                pool_id: pool_id.to_string(),
                winners: Vec::new(),
                max_score: 0,
                standings: Vec::new(),
            });
        }

        let user_ids: Vec<String> = standings.iter().map(|s| s.user_id.clone()).collect();
        let records = self.stats_repository.get_users(&user_ids).await?;
        let effects = build_close_effects(&pool, &standings, &records);
        let max_score = effects.winners.first().map(|w| w.points).unwrap_or(0);

        // Counters first, then the closed flag with its winners snapshot.
        // The snapshot is what a later reopen trusts to undo the wins.
        // If the flag flip fails the counters must come back out, or
        // they would drift with no snapshot left to revert them.
        self.stats_repository.apply_close_effects(&effects).await?;
        if let Err(close_error) = self
            .pool_repository
            .mark_closed(pool_id, effects.winners.clone())
            .await
        {
            let deltas = build_reopen_deltas(&standings);
            if let Err(revert_error) = self
                .stats_repository
                .revert_close_effects(&deltas, &effects.winners)
                .await
            {
                error!(
                    pool_id = %pool_id,
                    %revert_error,
                    "Counter revert failed after close failure, counters have drifted"
                );
            }
            return Err(close_error.into());
        }

        info!(
            pool_id = %pool_id,
            winners = effects.winners.len(),
            max_score,
            "Pool closed and scored"
        );

        Ok(CloseOutcome {
            pool_id: pool_id.to_string(),
            winners: effects.winners,
            max_score,
            standings,
        })
    }

    /// Reopens a closed pool, exactly reversing the counter mutations of
    /// `close`. Standings are recomputed freshly rather than trusted from
    /// a cache; leaderboard wins are reverted from the stored winners
    /// snapshot. Achievements stay unlocked.
    #[instrument(skip(self))]
    pub async fn reopen(&self, pool_id: &str) -> Result<(), LifecycleError> {
        let pool_lock = self.pool_lock(pool_id).await;
        let _guard = pool_lock.lock().await;

        let pool = self.get_pool(pool_id).await?;
        if !pool.is_closed {
            return Err(LifecycleError::NotClosed);
        }

        let standings = self.current_standings(&pool).await?;
        let deltas = build_reopen_deltas(&standings);

        self.stats_repository
            .revert_close_effects(&deltas, &pool.winners_data)
            .await?;
        if let Err(reopen_error) = self.pool_repository.mark_reopened(pool_id).await {
            // Re-apply what was just subtracted; the reopen deltas carry
            // no badges, so this cannot double-unlock anything.
            let reapply = CloseEffects {
                pool_id: pool.id.clone(),
                winners: pool.winners_data.clone(),
                deltas,
            };
            if let Err(reapply_error) = self.stats_repository.apply_close_effects(&reapply).await {
                error!(
                    pool_id = %pool_id,
                    %reapply_error,
                    "Counter re-apply failed after reopen failure, counters have drifted"
                );
            }
            return Err(reopen_error.into());
        }

        info!(
            pool_id = %pool_id,
            reverted_users = deltas.len(),
            reverted_wins = pool.winners_data.len(),
            "Pool reopened, counters reverted"
        );
        Ok(())
    }

    async fn get_pool(&self, pool_id: &str) -> Result<Pool, LifecycleError> {
        self.pool_repository
            .get_pool(pool_id)
            .await?
            .ok_or_else(|| LifecycleError::PoolNotFound(pool_id.to_string()))
    }

    async fn current_standings(&self, pool: &Pool) -> Result<Vec<Standing>, LifecycleError> {
        let predictions = self.pool_repository.list_predictions(&pool.id).await?;
        let entries: Vec<PredictionEntry> = predictions
            .into_iter()
            .map(|p| PredictionEntry {
                user_id: p.user_id,
                display_name: p.display_name,
                scorelines: p.scorelines,
            })
            .collect();
        Ok(compute_standings(&pool.matches, &pool.real_results, &entries))
    }
}
