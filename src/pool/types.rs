use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Match, MatchId, Scorelines, WinnerEntry};
use crate::scoring::{Scoreline, Standing};

/// A fixture in a create-pool request: either imported from the sports
/// API (carries `api_id`) or entered manually.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchInput {
    pub api_id: Option<u64>,
    pub home: String,
    pub away: String,
    pub championship: String,
    #[serde(default)]
    pub home_crest: Option<String>,
    #[serde(default)]
    pub away_crest: Option<String>,
    #[serde(default)]
    pub home_code: Option<String>,
    #[serde(default)]
    pub away_code: Option<String>,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePoolRequest {
    pub name: String,
    pub matches: Vec<MatchInput>,
}

/// A possibly half-filled scoreline as entered in a form. Only complete
/// pairs are kept; everything else counts as "unset".
///
/// Goal counts arrive as numbers or numeric strings (the original form
/// stores strings); empty strings and nulls mean "unset", anything else
/// is rejected at deserialization time.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScorelineInput {
    #[serde(default, deserialize_with = "goal_count")]
    pub home: Option<u32>,
    #[serde(default, deserialize_with = "goal_count")]
    pub away: Option<u32>,
}

fn goal_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("invalid goal count: {s:?}"))
            })
        }
    }
}

impl ScorelineInput {
    pub fn complete(&self) -> Option<Scoreline> {
        match (self.home, self.away) {
            (Some(home), Some(away)) => Some(Scoreline::new(home, away)),
            _ => None,
        }
    }
}

/// Keeps only the complete pairs from a form submission.
pub fn complete_scorelines(input: HashMap<MatchId, ScorelineInput>) -> Scorelines {
    input
        .into_iter()
        .filter_map(|(match_id, pair)| pair.complete().map(|s| (match_id, s)))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct PredictionRequest {
    pub scorelines: HashMap<MatchId, ScorelineInput>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    pub results: HashMap<MatchId, ScorelineInput>,
}

/// Pool summary for list views.
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolSummary {
    pub id: String,
    pub name: String,
    pub match_count: usize,
    pub is_active: bool,
    pub locked: bool,
    pub results_visible: bool,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

/// Full pool detail response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolDetail {
    pub id: String,
    pub name: String,
    pub matches: Vec<Match>,
    pub real_results: Scorelines,
    pub is_active: bool,
    pub locked: bool,
    pub results_visible: bool,
    pub is_closed: bool,
    pub winners_data: Vec<WinnerEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<super::models::Pool> for PoolDetail {
    fn from(pool: super::models::Pool) -> Self {
        Self {
            id: pool.id,
            name: pool.name,
            matches: pool.matches,
            real_results: pool.real_results,
            is_active: pool.is_active,
            locked: pool.locked,
            results_visible: pool.results_visible,
            is_closed: pool.is_closed,
            winners_data: pool.winners_data,
            created_at: pool.created_at,
        }
    }
}

impl From<&super::models::Pool> for PoolSummary {
    fn from(pool: &super::models::Pool) -> Self {
        Self {
            id: pool.id.clone(),
            name: pool.name.clone(),
            match_count: pool.matches.len(),
            is_active: pool.is_active,
            locked: pool.locked,
            results_visible: pool.results_visible,
            is_closed: pool.is_closed,
            created_at: pool.created_at,
        }
    }
}

/// Scoring table response for one pool.
#[derive(Debug, Serialize, Deserialize)]
pub struct StandingsResponse {
    pub pool_id: String,
    pub name: String,
    pub standings: Vec<Standing>,
    pub real_results: Scorelines,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_counts_accept_numbers_and_numeric_strings() {
        let input: ScorelineInput = serde_json::from_str(r#"{"home": 2, "away": "1"}"#).unwrap();
        assert_eq!(input.complete(), Some(Scoreline::new(2, 1)));
    }

    #[test]
    fn empty_and_missing_goal_counts_are_unset() {
        let input: ScorelineInput = serde_json::from_str(r#"{"home": "", "away": null}"#).unwrap();
        assert_eq!(input.home, None);
        assert_eq!(input.away, None);
        assert_eq!(input.complete(), None);

        let input: ScorelineInput = serde_json::from_str(r#"{"home": "2"}"#).unwrap();
        assert_eq!(input.home, Some(2));
        assert_eq!(input.complete(), None);
    }

    #[test]
    fn malformed_goal_counts_are_rejected() {
        assert!(serde_json::from_str::<ScorelineInput>(r#"{"home": "dos", "away": 1}"#).is_err());
        assert!(serde_json::from_str::<ScorelineInput>(r#"{"home": -1, "away": 1}"#).is_err());
    }
}
