use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Pool, Prediction, Scorelines, WinnerEntry};
use crate::shared::AppError;

/// Result of attempting to upsert a prediction
#[derive(Debug, Clone)]
pub enum UpsertPredictionResult {
    /// Prediction was stored, replacing any previous one
    Saved,
    /// The pool no longer accepts predictions (locked or closed)
    PredictionsFrozen,
    /// Pool does not exist
    PoolNotFound,
}

/// Trait for pool repository operations
///
/// `upsert_prediction`, `mark_closed` and `mark_reopened` are atomic
/// check-and-write operations: the state check and the write happen under
/// the same lock (or store transaction) so concurrent callers cannot
/// interleave between them.
#[async_trait]
pub trait PoolRepository: Send + Sync {
    async fn create_pool(&self, pool: &Pool) -> Result<(), AppError>;
    async fn get_pool(&self, pool_id: &str) -> Result<Option<Pool>, AppError>;
    async fn list_pools(&self) -> Result<Vec<Pool>, AppError>;
    /// Pools the live-result poller should refresh: active and not closed.
    async fn list_active_unclosed(&self) -> Result<Vec<Pool>, AppError>;
    /// Closed pools the user predicted in, oldest first, joined with the
    /// prediction. One call per profile view instead of one per pool.
    async fn list_participations(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Pool, Prediction)>, AppError>;
    /// Deletes the pool together with all of its predictions.
    async fn delete_pool(&self, pool_id: &str) -> Result<(), AppError>;

    async fn set_active(&self, pool_id: &str, value: bool) -> Result<(), AppError>;
    async fn set_locked(&self, pool_id: &str, value: bool) -> Result<(), AppError>;
    async fn set_results_visible(&self, pool_id: &str, value: bool) -> Result<(), AppError>;

    /// Replaces the stored actual results (manual admin entry).
    async fn set_results(&self, pool_id: &str, results: Scorelines) -> Result<(), AppError>;
    /// Merges fetched results into the stored actuals (live poller).
    /// Idempotent: re-applying the same map is a no-op.
    async fn merge_results(&self, pool_id: &str, results: Scorelines) -> Result<(), AppError>;

    async fn upsert_prediction(
        &self,
        pool_id: &str,
        prediction: Prediction,
    ) -> Result<UpsertPredictionResult, AppError>;
    async fn list_predictions(&self, pool_id: &str) -> Result<Vec<Prediction>, AppError>;
    async fn get_prediction(
        &self,
        pool_id: &str,
        user_id: &str,
    ) -> Result<Option<Prediction>, AppError>;

    /// Flips the pool to closed and persists the winners snapshot.
    async fn mark_closed(
        &self,
        pool_id: &str,
        winners: Vec<WinnerEntry>,
    ) -> Result<(), AppError>;
    /// Flips the pool back to open and clears the winners snapshot.
    async fn mark_reopened(&self, pool_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
struct PoolRecord {
    pool: Pool,
    predictions: HashMap<String, Prediction>,
}

/// In-memory implementation of PoolRepository for development and testing
pub struct InMemoryPoolRepository {
    pools: Mutex<HashMap<String, PoolRecord>>,
}

impl Default for InMemoryPoolRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPoolRepository {
    pub fn new() -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
        }
    }

    fn with_pool<T>(
        &self,
        pool_id: &str,
        f: impl FnOnce(&mut PoolRecord) -> T,
    ) -> Result<T, AppError> {
        let mut pools = self.pools.lock().unwrap();
        let record = pools
            .get_mut(pool_id)
            .ok_or_else(|| AppError::NotFound(format!("Pool {pool_id} not found")))?;
        Ok(f(record))
    }
}

#[async_trait]
impl PoolRepository for InMemoryPoolRepository {
    #[instrument(skip(self, pool))]
    async fn create_pool(&self, pool: &Pool) -> Result<(), AppError> {
        let mut pools = self.pools.lock().unwrap();
        if pools.contains_key(&pool.id) {
            warn!(pool_id = %pool.id, "Pool already exists in memory");
            return Err(AppError::Conflict("Pool already exists".to_string()));
        }
        debug!(pool_id = %pool.id, name = %pool.name, "Creating pool in memory");
        pools.insert(
            pool.id.clone(),
            PoolRecord {
                pool: pool.clone(),
                predictions: HashMap::new(),
            },
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_pool(&self, pool_id: &str) -> Result<Option<Pool>, AppError> {
        let pools = self.pools.lock().unwrap();
        Ok(pools.get(pool_id).map(|r| r.pool.clone()))
    }

    #[instrument(skip(self))]
    async fn list_pools(&self) -> Result<Vec<Pool>, AppError> {
        let pools = self.pools.lock().unwrap();
        let mut list: Vec<Pool> = pools.values().map(|r| r.pool.clone()).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn list_active_unclosed(&self) -> Result<Vec<Pool>, AppError> {
        let pools = self.pools.lock().unwrap();
        Ok(pools
            .values()
            .filter(|r| r.pool.is_active && !r.pool.is_closed)
            .map(|r| r.pool.clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_participations(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Pool, Prediction)>, AppError> {
        let pools = self.pools.lock().unwrap();
        let mut list: Vec<(Pool, Prediction)> = pools
            .values()
            .filter(|r| r.pool.is_closed)
            .filter_map(|r| {
                r.predictions
                    .get(user_id)
                    .map(|p| (r.pool.clone(), p.clone()))
            })
            .collect();
        list.sort_by(|a, b| a.0.created_at.cmp(&b.0.created_at));
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn delete_pool(&self, pool_id: &str) -> Result<(), AppError> {
        let mut pools = self.pools.lock().unwrap();
        if pools.remove(pool_id).is_none() {
            return Err(AppError::NotFound(format!("Pool {pool_id} not found")));
        }
        debug!(pool_id = %pool_id, "Pool and its predictions deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, pool_id: &str, value: bool) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| r.pool.is_active = value)
    }

    #[instrument(skip(self))]
    async fn set_locked(&self, pool_id: &str, value: bool) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| r.pool.locked = value)
    }

    #[instrument(skip(self))]
    async fn set_results_visible(&self, pool_id: &str, value: bool) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| r.pool.results_visible = value)
    }

    #[instrument(skip(self, results))]
    async fn set_results(&self, pool_id: &str, results: Scorelines) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| r.pool.real_results = results)
    }

    #[instrument(skip(self, results))]
    async fn merge_results(&self, pool_id: &str, results: Scorelines) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| {
            for (match_id, scoreline) in results {
                r.pool.real_results.insert(match_id, scoreline);
            }
        })
    }

    #[instrument(skip(self, prediction))]
    async fn upsert_prediction(
        &self,
        pool_id: &str,
        prediction: Prediction,
    ) -> Result<UpsertPredictionResult, AppError> {
        let mut pools = self.pools.lock().unwrap();
        let record = match pools.get_mut(pool_id) {
            Some(record) => record,
            None => return Ok(UpsertPredictionResult::PoolNotFound),
        };
        if !record.pool.accepts_predictions() {
            debug!(pool_id = %pool_id, user_id = %prediction.user_id, "Prediction rejected, pool frozen");
            return Ok(UpsertPredictionResult::PredictionsFrozen);
        }
        record
            .predictions
            .insert(prediction.user_id.clone(), prediction);
        Ok(UpsertPredictionResult::Saved)
    }

    #[instrument(skip(self))]
    async fn list_predictions(&self, pool_id: &str) -> Result<Vec<Prediction>, AppError> {
        self.with_pool(pool_id, |r| {
            let mut list: Vec<Prediction> = r.predictions.values().cloned().collect();
            list.sort_by(|a, b| a.display_name.cmp(&b.display_name));
            list
        })
    }

    #[instrument(skip(self))]
    async fn get_prediction(
        &self,
        pool_id: &str,
        user_id: &str,
    ) -> Result<Option<Prediction>, AppError> {
        self.with_pool(pool_id, |r| r.predictions.get(user_id).cloned())
    }

    #[instrument(skip(self, winners))]
    async fn mark_closed(
        &self,
        pool_id: &str,
        winners: Vec<WinnerEntry>,
    ) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| {
            if r.pool.is_closed {
                return Err(AppError::Conflict("Pool is already closed".to_string()));
            }
            r.pool.is_closed = true;
            r.pool.winners_data = winners;
            Ok(())
        })?
    }

    #[instrument(skip(self))]
    async fn mark_reopened(&self, pool_id: &str) -> Result<(), AppError> {
        self.with_pool(pool_id, |r| {
            if !r.pool.is_closed {
                return Err(AppError::Conflict("Pool is not closed".to_string()));
            }
            r.pool.is_closed = false;
            r.pool.winners_data = Vec::new();
            Ok(())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::models::Match;
    use crate::scoring::Scoreline;

    fn sample_pool(name: &str) -> Pool {
        Pool::new(
            name.to_string(),
            vec![
                Match::manual("m1", "Colombia", "Brasil", "Eliminatorias"),
                Match::manual("m2", "Argentina", "Chile", "Eliminatorias"),
            ],
        )
    }

    fn prediction(user_id: &str) -> Prediction {
        Prediction::new(
            user_id.to_string(),
            user_id.to_string(),
            [("m1".to_string(), Scoreline::new(1, 0))].into(),
        )
    }

    #[tokio::test]
    async fn create_and_get_pool() {
        let repo = InMemoryPoolRepository::new();
        let pool = sample_pool("Jornada 1");
        repo.create_pool(&pool).await.unwrap();

        let fetched = repo.get_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Jornada 1");
        assert!(!fetched.is_closed);

        assert!(repo.create_pool(&pool).await.is_err());
    }

    #[tokio::test]
    async fn upsert_replaces_previous_prediction() {
        let repo = InMemoryPoolRepository::new();
        let pool = sample_pool("Jornada 1");
        repo.create_pool(&pool).await.unwrap();

        repo.upsert_prediction(&pool.id, prediction("alice"))
            .await
            .unwrap();
        let mut updated = prediction("alice");
        updated
            .scorelines
            .insert("m2".to_string(), Scoreline::new(2, 2));
        repo.upsert_prediction(&pool.id, updated).await.unwrap();

        let predictions = repo.list_predictions(&pool.id).await.unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].scorelines.len(), 2);
    }

    #[tokio::test]
    async fn frozen_pool_rejects_upsert() {
        let repo = InMemoryPoolRepository::new();
        let pool = sample_pool("Jornada 1");
        repo.create_pool(&pool).await.unwrap();
        repo.set_locked(&pool.id, true).await.unwrap();

        let result = repo
            .upsert_prediction(&pool.id, prediction("alice"))
            .await
            .unwrap();
        assert!(matches!(result, UpsertPredictionResult::PredictionsFrozen));
        assert!(repo.list_predictions(&pool.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_results_keeps_existing_entries() {
        let repo = InMemoryPoolRepository::new();
        let pool = sample_pool("Jornada 1");
        repo.create_pool(&pool).await.unwrap();

        repo.merge_results(
            &pool.id,
            [("m1".to_string(), Scoreline::new(1, 0))].into(),
        )
        .await
        .unwrap();
        repo.merge_results(
            &pool.id,
            [("m2".to_string(), Scoreline::new(0, 0))].into(),
        )
        .await
        .unwrap();

        let fetched = repo.get_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(fetched.real_results.len(), 2);
        assert!(fetched.results_complete());
    }

    #[tokio::test]
    async fn mark_closed_is_guarded() {
        let repo = InMemoryPoolRepository::new();
        let pool = sample_pool("Jornada 1");
        repo.create_pool(&pool).await.unwrap();

        repo.mark_closed(&pool.id, vec![]).await.unwrap();
        assert!(repo.mark_closed(&pool.id, vec![]).await.is_err());

        repo.mark_reopened(&pool.id).await.unwrap();
        assert!(repo.mark_reopened(&pool.id).await.is_err());

        let fetched = repo.get_pool(&pool.id).await.unwrap().unwrap();
        assert!(!fetched.is_closed);
        assert!(fetched.winners_data.is_empty());
    }

    #[tokio::test]
    async fn participations_join_closed_pools_with_predictions() {
        let repo = InMemoryPoolRepository::new();
        let mut old_closed = sample_pool("Jornada 1");
        old_closed.created_at = chrono::Utc::now() - chrono::Duration::days(2);
        let recent_closed = sample_pool("Jornada 2");
        let open = sample_pool("Jornada 3");
        for pool in [&old_closed, &recent_closed, &open] {
            repo.create_pool(pool).await.unwrap();
            repo.upsert_prediction(&pool.id, prediction("alice"))
                .await
                .unwrap();
        }
        repo.mark_closed(&old_closed.id, vec![]).await.unwrap();
        repo.mark_closed(&recent_closed.id, vec![]).await.unwrap();

        let participations = repo.list_participations("alice").await.unwrap();
        let names: Vec<&str> = participations
            .iter()
            .map(|(pool, _)| pool.name.as_str())
            .collect();
        assert_eq!(names, vec!["Jornada 1", "Jornada 2"]);
        assert_eq!(participations[0].1.user_id, "alice");

        assert!(repo.list_participations("bob").await.unwrap().is_empty());
    }

}
