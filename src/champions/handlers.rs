use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{instrument, warn};

use super::models::ChampionsBook;
use super::scoring::{compute_table, ChampionsRow};
use crate::identity::authenticate;
use crate::shared::{AppError, AppState};
use crate::sports::SportsDataProvider;

#[derive(Debug, Serialize)]
pub struct ChampionsResponse {
    pub leagues: Vec<LeagueView>,
    pub table: Vec<ChampionsRow>,
}

#[derive(Debug, Serialize)]
pub struct LeagueView {
    pub name: String,
    pub emblem: Option<String>,
    /// True top-4 as far as we know it; empty when the fetch failed and
    /// no static standings are configured.
    pub standings: Vec<String>,
}

/// Resolves each league's standings, preferring the live provider and
/// falling back to statically configured standings. A failed fetch only
/// drops that league from scoring.
async fn resolve_standings(
    state: &AppState,
    book: &ChampionsBook,
) -> HashMap<String, Vec<String>> {
    let mut standings = HashMap::new();
    for league in &book.leagues {
        let fetched = match league.competition_id {
            Some(competition_id) => match state.sports.get_standings(competition_id).await {
                Ok(teams) if teams.len() >= 4 => Some(teams),
                Ok(_) => None,
                Err(error) => {
                    warn!(league = %league.name, %error, "Standings fetch failed");
                    None
                }
            },
            None => None,
        };
        let teams = fetched.or_else(|| {
            (league.static_standings.len() >= 4).then(|| league.static_standings.clone())
        });
        if let Some(teams) = teams {
            standings.insert(league.name.clone(), teams);
        }
    }
    standings
}

/// GET /champions
#[instrument(name = "get_champions", skip(state, headers))]
pub async fn get_champions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChampionsResponse>, AppError> {
    authenticate(&state, &headers).await?;

    let book = &state.champions;
    let standings = resolve_standings(&state, book).await;
    let table = compute_table(book, &standings);
    let leagues = book
        .leagues
        .iter()
        .map(|league| LeagueView {
            name: league.name.clone(),
            emblem: league.emblem.clone(),
            standings: standings.get(&league.name).cloned().unwrap_or_default(),
        })
        .collect();

    Ok(Json(ChampionsResponse { leagues, table }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::champions::models::{ChampionsPlayer, League, LeagueVariant};
    use crate::identity::{CurrentUser, StaticTokenIdentity};
    use crate::scoring::Scoreline;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::sports::{Fixture, ProviderError, SportsDataProvider};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Provider that knows standings for competition 1 and fails for
    /// everything else.
    struct OneLeagueProvider;

    #[async_trait]
    impl SportsDataProvider for OneLeagueProvider {
        async fn list_fixtures(&self, _competition_id: u64) -> Result<Vec<Fixture>, ProviderError> {
            Ok(Vec::new())
        }
        async fn get_scores(
            &self,
            _match_ids: &[u64],
        ) -> Result<HashMap<u64, Scoreline>, ProviderError> {
            Ok(HashMap::new())
        }
        async fn get_standings(&self, competition_id: u64) -> Result<Vec<String>, ProviderError> {
            if competition_id == 1 {
                Ok(vec![
                    "A".to_string(),
                    "B".to_string(),
                    "C".to_string(),
                    "D".to_string(),
                ])
            } else {
                Err(ProviderError::Unavailable("timeout".to_string()))
            }
        }
    }

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn book() -> ChampionsBook {
        ChampionsBook {
            leagues: vec![
                League {
                    name: "Euro".to_string(),
                    competition_id: Some(1),
                    variant: LeagueVariant::TopFour,
                    emblem: None,
                    static_standings: Vec::new(),
                },
                League {
                    name: "Broken".to_string(),
                    competition_id: Some(2),
                    variant: LeagueVariant::TopFour,
                    emblem: None,
                    static_standings: Vec::new(),
                },
                League {
                    name: "Domestic".to_string(),
                    competition_id: None,
                    variant: LeagueVariant::DomesticPairs,
                    emblem: None,
                    static_standings: teams(&["P", "Q", "R", "S"]),
                },
            ],
            players: vec![ChampionsPlayer {
                name: "DANIEL".to_string(),
                predictions: vec![
                    teams(&["A", "B", "C", "D"]),
                    teams(&["A", "B", "C", "D"]),
                    teams(&["Q", "P", "R", "S"]),
                ],
            }],
        }
    }

    fn app() -> Router {
        let identity = Arc::new(StaticTokenIdentity::new());
        identity.register(
            "tok-alice",
            CurrentUser {
                id: "alice".to_string(),
                display_name: "Alice".to_string(),
                is_admin: false,
            },
        );
        let state = AppStateBuilder::new()
            .with_identity(identity)
            .with_sports(Arc::new(OneLeagueProvider))
            .with_champions(Arc::new(book()))
            .build();
        Router::new()
            .route("/champions", get(get_champions))
            .with_state(state)
    }

    #[tokio::test]
    async fn table_degrades_when_a_league_fails() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/champions")
                    .header("authorization", "Bearer tok-alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        // Euro scores 14, Domestic scores 14 via static standings; the
        // broken league contributes nothing.
        let row = &body["table"][0];
        assert_eq!(row["name"], "DANIEL");
        assert_eq!(row["total_points"], 28);
        assert!(row["points_by_league"].get("Broken").is_none());

        let leagues = body["leagues"].as_array().unwrap();
        let broken = leagues.iter().find(|l| l["name"] == "Broken").unwrap();
        assert_eq!(broken["standings"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn champions_requires_authentication() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/champions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
