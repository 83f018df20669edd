use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::repository::StatsRepository;
use super::service::ProfileService;
use super::types::{LeaderboardRow, ProfileResponse, SetWinsRequest};
use crate::identity::{authenticate, require_admin};
use crate::shared::{AppError, AppState};

/// GET /profile/:user_id
///
/// Any authenticated user may view any profile; viewing recomputes the
/// lifetime stats and persists newly earned badges.
#[instrument(name = "get_profile", skip(state, headers))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, AppError> {
    authenticate(&state, &headers).await?;

    let service = ProfileService::new(
        Arc::clone(&state.pool_repository),
        Arc::clone(&state.stats_repository),
    );
    let profile = service.get_profile(&user_id).await?;
    Ok(Json(profile))
}

/// GET /leaderboard
#[instrument(name = "get_leaderboard", skip(state, headers))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    authenticate(&state, &headers).await?;

    let service = ProfileService::new(
        Arc::clone(&state.pool_repository),
        Arc::clone(&state.stats_repository),
    );
    let rows = service.leaderboard().await?;
    Ok(Json(rows))
}

/// PUT /leaderboard/:user_id (admin)
///
/// Sets a user's win count to an absolute value, for manual corrections.
#[instrument(name = "set_leaderboard_wins", skip(state, headers))]
pub async fn set_wins(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SetWinsRequest>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    info!(
        user_id = %user_id,
        total_wins = request.total_wins,
        admin = %admin.id,
        "Admin overriding win count"
    );

    let display_name = state
        .stats_repository
        .get_user(&user_id)
        .await?
        .map(|r| r.display_name)
        .unwrap_or_else(|| user_id.clone());
    state
        .stats_repository
        .set_total_wins(&user_id, &display_name, request.total_wins)
        .await?;
    Ok(Json(
        json!({ "user_id": user_id, "total_wins": request.total_wins }),
    ))
}
