use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::Scoreline;

/// Match identifiers are strings: fixtures imported from the sports API
/// carry the provider's numeric id rendered as a string, manually entered
/// fixtures get a locally generated id.
pub type MatchId = String;

/// Map of match id to scoreline, used both for a user's predictions and
/// for a pool's actual results.
pub type Scorelines = HashMap<MatchId, Scoreline>;

/// A fixture inside a pool. Immutable once created apart from admin
/// metadata corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Sports-API match id, set only for imported fixtures. The live
    /// result poller only refreshes matches that carry one.
    pub api_id: Option<u64>,
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
    pub championship: String,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Match {
    /// Creates a manually entered fixture with a local id.
    pub fn manual(id: &str, home: &str, away: &str, championship: &str) -> Self {
        Self {
            id: id.to_string(),
            api_id: None,
            home: home.to_string(),
            away: away.to_string(),
            home_crest: None,
            away_crest: None,
            home_code: None,
            away_code: None,
            championship: championship.to_string(),
            kickoff: None,
            status: None,
        }
    }

    /// Creates a fixture imported from the sports API.
    pub fn from_api(
        api_id: u64,
        home: String,
        away: String,
        championship: String,
        kickoff: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: api_id.to_string(),
            api_id: Some(api_id),
            home,
            away,
            home_crest: None,
            away_crest: None,
            home_code: None,
            away_code: None,
            championship,
            kickoff,
            status: None,
        }
    }
}

/// Snapshot entry for a pool winner, persisted at close time. The stored
/// snapshot is the sole source of truth for reverting leaderboard wins
/// when the pool is reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    pub user_id: String,
    pub display_name: String,
    pub points: u32,
}

/// The central aggregate: a named set of matches collecting one
/// prediction per user, with its own lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub matches: Vec<Match>,
    /// Actual results, keyed by match id. Partial while matches are
    /// still being played.
    pub real_results: Scorelines,
    /// Visible and selectable by players. Several pools may be active
    /// at the same time.
    pub is_active: bool,
    /// Predictions frozen; toggled independently of the other flags.
    pub locked: bool,
    /// Scoring table visible to non-admins.
    pub results_visible: bool,
    pub is_closed: bool,
    /// Winners snapshot, non-empty only while the pool is closed.
    pub winners_data: Vec<WinnerEntry>,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    pub fn new(name: String, matches: Vec<Match>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            matches,
            real_results: Scorelines::new(),
            is_active: false,
            locked: false,
            results_visible: false,
            is_closed: false,
            winners_data: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// True when every match has an actual result, the precondition for
    /// closing the pool.
    pub fn results_complete(&self) -> bool {
        self.matches
            .iter()
            .all(|m| self.real_results.contains_key(&m.id))
    }

    /// Match ids the live poller can refresh from the sports API.
    pub fn api_match_ids(&self) -> Vec<u64> {
        self.matches.iter().filter_map(|m| m.api_id).collect()
    }

    /// True while the owning user may still create or update their
    /// prediction.
    pub fn accepts_predictions(&self) -> bool {
        !self.locked && !self.is_closed
    }
}

/// One user's prediction for one pool. Upsert semantics: the latest write
/// replaces any previous one, no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub user_id: String,
    pub display_name: String,
    pub scorelines: Scorelines,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(user_id: String, display_name: String, scorelines: Scorelines) -> Self {
        Self {
            user_id,
            display_name,
            scorelines,
            updated_at: Utc::now(),
        }
    }
}
