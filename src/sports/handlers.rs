use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{Fixture, SportsDataProvider};
use crate::identity::require_admin;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
}

/// GET /fixtures/:competition_id (admin)
///
/// Scheduled fixtures, for building a pool from upcoming matches.
#[instrument(name = "list_fixtures", skip(state, headers))]
pub async fn list_fixtures(
    State(state): State<AppState>,
    Path(competition_id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Fixture>>, AppError> {
    require_admin(&state, &headers).await?;
    let fixtures = state.sports.list_fixtures(competition_id).await?;
    Ok(Json(fixtures))
}

/// PUT /live-updates (admin)
///
/// Pauses or resumes the live-result poller, so manually entered results
/// are not overwritten mid-edit.
#[instrument(name = "set_live_updates", skip(state, headers))]
pub async fn set_live_updates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PauseRequest>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    state.live_updates.set_paused(request.paused);
    info!(paused = request.paused, admin = %admin.id, "Live updates toggled");
    Ok(Json(json!({ "paused": request.paused })))
}
