pub mod client;
pub mod handlers;
pub mod poller;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::Scoreline;
use crate::shared::AppError;

pub use client::FootballDataClient;
pub use poller::{start_live_updates_task, PollerConfig};

/// Errors from the external sports data provider. Always treated as
/// degraded input, never as a reason to fail scoring or predictions.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected provider payload: {0}")]
    Payload(String),
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        AppError::Provider(error.to_string())
    }
}

/// A scheduled fixture as offered by the provider, used when an admin
/// builds a pool from upcoming matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub api_id: u64,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub home_crest: Option<String>,
    #[serde(default)]
    pub away_crest: Option<String>,
    #[serde(default)]
    pub home_code: Option<String>,
    #[serde(default)]
    pub away_code: Option<String>,
    pub kickoff: Option<DateTime<Utc>>,
}

/// Narrow interface over the sports data API. Every method may fail or
/// return partial data; callers degrade gracefully.
#[async_trait]
pub trait SportsDataProvider: Send + Sync {
    /// Scheduled fixtures for a competition.
    async fn list_fixtures(&self, competition_id: u64) -> Result<Vec<Fixture>, ProviderError>;
    /// Current scores for the given match ids. Only matches that are in
    /// play, paused or finished appear in the result.
    async fn get_scores(&self, match_ids: &[u64])
        -> Result<HashMap<u64, Scoreline>, ProviderError>;
    /// Top teams of a competition table, best first.
    async fn get_standings(&self, competition_id: u64) -> Result<Vec<String>, ProviderError>;
}

/// Stand-in provider used when no API key is configured. Every call
/// reports the provider as unavailable, so fixtures come back as 502
/// and champions standings fall back to their static tables.
pub struct DisabledSportsProvider;

#[async_trait]
impl SportsDataProvider for DisabledSportsProvider {
    async fn list_fixtures(&self, _competition_id: u64) -> Result<Vec<Fixture>, ProviderError> {
        Err(ProviderError::Unavailable(
            "no sports API key configured".to_string(),
        ))
    }

    async fn get_scores(
        &self,
        _match_ids: &[u64],
    ) -> Result<HashMap<u64, Scoreline>, ProviderError> {
        Err(ProviderError::Unavailable(
            "no sports API key configured".to_string(),
        ))
    }

    async fn get_standings(&self, _competition_id: u64) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::Unavailable(
            "no sports API key configured".to_string(),
        ))
    }
}

/// Shared pause switch for the live-result poller. Admins flip it while
/// entering results by hand so the poller does not overwrite them.
#[derive(Clone)]
pub struct LiveUpdatesHandle {
    paused: Arc<AtomicBool>,
}

impl Default for LiveUpdatesHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveUpdatesHandle {
    pub fn new() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
