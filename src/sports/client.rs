use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{Fixture, ProviderError, SportsDataProvider};
use crate::scoring::Scoreline;

const DEFAULT_BASE_URL: &str = "https://api.football-data.org/v4";

/// Match statuses whose score counts as a usable result.
const LIVE_STATUSES: [&str; 3] = ["IN_PLAY", "PAUSED", "FINISHED"];

/// Client for the football-data.org v4 API.
pub struct FootballDataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FootballDataClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct MatchesPayload {
    matches: Vec<ApiMatch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    id: u64,
    #[serde(default)]
    utc_date: Option<DateTime<Utc>>,
    #[serde(default)]
    status: Option<String>,
    home_team: ApiTeam,
    away_team: ApiTeam,
    #[serde(default)]
    score: Option<ApiScore>,
}

#[derive(Deserialize)]
struct ApiTeam {
    name: String,
    #[serde(default)]
    crest: Option<String>,
    #[serde(default)]
    tla: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    #[serde(default)]
    full_time: Option<ApiScorePair>,
}

#[derive(Deserialize)]
struct ApiScorePair {
    home: Option<u32>,
    away: Option<u32>,
}

#[derive(Deserialize)]
struct StandingsPayload {
    standings: Vec<ApiStandingGroup>,
}

#[derive(Deserialize)]
struct ApiStandingGroup {
    table: Vec<ApiStandingRow>,
}

#[derive(Deserialize)]
struct ApiStandingRow {
    team: ApiTeam,
}

#[async_trait]
impl SportsDataProvider for FootballDataClient {
    #[instrument(skip(self))]
    async fn list_fixtures(&self, competition_id: u64) -> Result<Vec<Fixture>, ProviderError> {
        let payload: MatchesPayload = self
            .get_json(&format!(
                "competitions/{competition_id}/matches?status=SCHEDULED"
            ))
            .await?;
        debug!(
            competition_id,
            count = payload.matches.len(),
            "Fetched scheduled fixtures"
        );
        Ok(payload
            .matches
            .into_iter()
            .map(|m| Fixture {
                api_id: m.id,
                home: m.home_team.name,
                away: m.away_team.name,
                home_crest: m.home_team.crest,
                away_crest: m.away_team.crest,
                home_code: m.home_team.tla,
                away_code: m.away_team.tla,
                kickoff: m.utc_date,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_scores(
        &self,
        match_ids: &[u64],
    ) -> Result<HashMap<u64, Scoreline>, ProviderError> {
        if match_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = match_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let payload: MatchesPayload = self.get_json(&format!("matches?ids={ids}")).await?;

        let mut scores = HashMap::new();
        for m in payload.matches {
            let live = m
                .status
                .as_deref()
                .map(|s| LIVE_STATUSES.contains(&s))
                .unwrap_or(false);
            if !live {
                continue;
            }
            // A started match with no goals yet reports null sides; the
            // original treats those as 0.
            let full_time = m.score.and_then(|s| s.full_time);
            let (home, away) = match full_time {
                Some(pair) => (pair.home.unwrap_or(0), pair.away.unwrap_or(0)),
                None => (0, 0),
            };
            scores.insert(m.id, Scoreline::new(home, away));
        }
        debug!(requested = match_ids.len(), usable = scores.len(), "Fetched live scores");
        Ok(scores)
    }

    #[instrument(skip(self))]
    async fn get_standings(&self, competition_id: u64) -> Result<Vec<String>, ProviderError> {
        let payload: StandingsPayload = self
            .get_json(&format!("competitions/{competition_id}/standings"))
            .await?;
        let table = payload
            .standings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Payload("standings payload has no table".to_string()))?
            .table;
        Ok(table.into_iter().take(4).map(|row| row.team.name).collect())
    }
}
