use std::sync::Arc;

use tracing::{info, instrument};

use super::models::{Match, Pool, Prediction, Scorelines};
use super::repository::{PoolRepository, UpsertPredictionResult};
use super::types::{CreatePoolRequest, MatchInput, PoolDetail, StandingsResponse};
use crate::identity::CurrentUser;
use crate::scoring::{compute_standings, PredictionEntry};
use crate::shared::AppError;
use crate::stats::StatsRepository;

/// Pool creation, prediction upserts and the scoring table view.
///
/// Lifecycle transitions (close, reopen, delete, flag toggles) live in
/// `lifecycle::LifecycleService`, where they share one per-pool lock;
/// this service never mutates counters.
pub struct PoolService {
    pool_repository: Arc<dyn PoolRepository>,
    stats_repository: Arc<dyn StatsRepository>,
}

impl PoolService {
    pub fn new(
        pool_repository: Arc<dyn PoolRepository>,
        stats_repository: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            pool_repository,
            stats_repository,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_pool(&self, request: CreatePoolRequest) -> Result<Pool, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Pool name cannot be empty".to_string()));
        }
        if request.matches.is_empty() {
            return Err(AppError::Validation(
                "A pool needs at least one match".to_string(),
            ));
        }

        let matches: Vec<Match> = request
            .matches
            .into_iter()
            .enumerate()
            .map(|(index, input)| build_match(index, input))
            .collect::<Result<_, _>>()?;

        let pool = Pool::new(name.to_string(), matches);
        self.pool_repository.create_pool(&pool).await?;
        info!(pool_id = %pool.id, name = %pool.name, matches = pool.matches.len(), "Pool created");
        Ok(pool)
    }

    pub async fn get_pool(&self, pool_id: &str) -> Result<Pool, AppError> {
        self.pool_repository
            .get_pool(pool_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pool {pool_id} not found")))
    }

    /// Stores or replaces the user's prediction, keeping only complete
    /// scoreline pairs. Also makes sure the user has a stats record so
    /// later close transactions and profile views can find them.
    #[instrument(skip(self, scorelines))]
    pub async fn submit_prediction(
        &self,
        pool_id: &str,
        user: &CurrentUser,
        scorelines: Scorelines,
    ) -> Result<Prediction, AppError> {
        if scorelines.is_empty() {
            return Err(AppError::Validation(
                "Prediction has no complete scorelines".to_string(),
            ));
        }
        let pool = self.get_pool(pool_id).await?;
        let unknown: Vec<&str> = scorelines
            .keys()
            .filter(|id| !pool.matches.iter().any(|m| &m.id == *id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "Unknown match ids: {}",
                unknown.join(", ")
            )));
        }

        let prediction = Prediction::new(user.id.clone(), user.display_name.clone(), scorelines);
        match self
            .pool_repository
            .upsert_prediction(pool_id, prediction.clone())
            .await?
        {
            UpsertPredictionResult::Saved => {}
            UpsertPredictionResult::PredictionsFrozen => {
                return Err(AppError::Conflict(
                    "Pool no longer accepts predictions".to_string(),
                ));
            }
            UpsertPredictionResult::PoolNotFound => {
                return Err(AppError::NotFound(format!("Pool {pool_id} not found")));
            }
        }

        self.stats_repository
            .register_user(&user.id, &user.display_name)
            .await?;
        info!(pool_id = %pool_id, user_id = %user.id, "Prediction saved");
        Ok(prediction)
    }

    /// Replaces the pool's actual results with manually entered ones.
    #[instrument(skip(self, results))]
    pub async fn set_results(&self, pool_id: &str, results: Scorelines) -> Result<Pool, AppError> {
        let pool = self.get_pool(pool_id).await?;
        if pool.is_closed {
            return Err(AppError::Conflict(
                "Results of a closed pool cannot be edited".to_string(),
            ));
        }
        let unknown: Vec<&str> = results
            .keys()
            .filter(|id| !pool.matches.iter().any(|m| &m.id == *id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "Unknown match ids: {}",
                unknown.join(", ")
            )));
        }
        self.pool_repository.set_results(pool_id, results).await?;
        self.get_pool(pool_id).await
    }

    /// The scoring table for a pool. Non-admins only see it once the
    /// admin has flipped `results_visible`.
    #[instrument(skip(self, viewer))]
    pub async fn standings(
        &self,
        pool_id: &str,
        viewer: &CurrentUser,
    ) -> Result<StandingsResponse, AppError> {
        let pool = self.get_pool(pool_id).await?;
        if !pool.results_visible && !viewer.is_admin {
            return Err(AppError::Forbidden(
                "Results are not visible yet".to_string(),
            ));
        }

        let predictions = self.pool_repository.list_predictions(pool_id).await?;
        let entries: Vec<PredictionEntry> = predictions
            .into_iter()
            .map(|p| PredictionEntry {
                user_id: p.user_id,
                display_name: p.display_name,
                scorelines: p.scorelines,
            })
            .collect();
        let standings = compute_standings(&pool.matches, &pool.real_results, &entries);

        Ok(StandingsResponse {
            pool_id: pool.id,
            name: pool.name,
            standings,
            real_results: pool.real_results,
        })
    }

    pub async fn detail(&self, pool_id: &str) -> Result<PoolDetail, AppError> {
        Ok(self.get_pool(pool_id).await?.into())
    }
}

fn build_match(index: usize, input: MatchInput) -> Result<Match, AppError> {
    if input.home.trim().is_empty() || input.away.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Match {index} is missing a team name"
        )));
    }
    let mut m = match input.api_id {
        Some(api_id) => Match::from_api(
            api_id,
            input.home,
            input.away,
            input.championship,
            input.kickoff,
        ),
        None => {
            let mut manual = Match::manual(
                &format!("manual-{index}"),
                &input.home,
                &input.away,
                &input.championship,
            );
            manual.kickoff = input.kickoff;
            manual
        }
    };
    m.home_crest = input.home_crest;
    m.away_crest = input.away_crest;
    m.home_code = input.home_code;
    m.away_code = input.away_code;
    Ok(m)
}
