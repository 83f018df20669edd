use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use super::{LiveUpdatesHandle, SportsDataProvider};
use crate::pool::models::Scorelines;
use crate::pool::repository::PoolRepository;
use crate::shared::AppError;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Starts the background task that refreshes live results for every
/// active, unclosed pool.
#[instrument(skip(pool_repository, sports, handle))]
pub async fn start_live_updates_task(
    pool_repository: Arc<dyn PoolRepository>,
    sports: Arc<dyn SportsDataProvider>,
    handle: LiveUpdatesHandle,
    config: PollerConfig,
) {
    info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting live updates background task"
    );

    let mut poll_interval = interval(config.poll_interval);

    loop {
        poll_interval.tick().await;

        if handle.is_paused() {
            debug!("Live updates paused by admin, skipping cycle");
            continue;
        }

        match poll_once(&pool_repository, &sports).await {
            Ok(updated) => {
                debug!(pools_updated = updated, "Live update cycle completed");
            }
            Err(e) => {
                error!(error = %e, "Live update cycle failed");
            }
        }
    }
}

/// One poll cycle: gathers API match ids across active pools, fetches
/// their scores and merges them into each pool. Returns the number of
/// pools that received updates. A provider failure aborts the cycle
/// without touching any pool; a failure on a single pool only skips
/// that pool.
#[instrument(skip(pool_repository, sports))]
pub async fn poll_once(
    pool_repository: &Arc<dyn PoolRepository>,
    sports: &Arc<dyn SportsDataProvider>,
) -> Result<usize, AppError> {
    let pools = pool_repository.list_active_unclosed().await?;
    if pools.is_empty() {
        return Ok(0);
    }

    let mut match_ids: HashSet<u64> = HashSet::new();
    for pool in &pools {
        match_ids.extend(pool.api_match_ids());
    }
    if match_ids.is_empty() {
        return Ok(0);
    }

    let ids: Vec<u64> = match_ids.into_iter().collect();
    let scores = sports.get_scores(&ids).await.map_err(AppError::from)?;
    if scores.is_empty() {
        return Ok(0);
    }

    let mut updated = 0;
    for pool in &pools {
        let results: Scorelines = pool
            .api_match_ids()
            .iter()
            .filter_map(|api_id| {
                scores
                    .get(api_id)
                    .map(|scoreline| (api_id.to_string(), *scoreline))
            })
            .collect();
        if results.is_empty() {
            continue;
        }
        match pool_repository.merge_results(&pool.id, results).await {
            Ok(()) => {
                updated += 1;
                debug!(pool_id = %pool.id, "Merged live results");
            }
            Err(e) => {
                warn!(pool_id = %pool.id, error = %e, "Failed to merge live results");
            }
        }
    }

    Ok(updated)
}
