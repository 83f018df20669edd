use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::champions::ChampionsBook;
use crate::identity::IdentityProvider;
use crate::lifecycle::LifecycleService;
use crate::pool::repository::PoolRepository;
use crate::sports::{LiveUpdatesHandle, SportsDataProvider};
use crate::stats::repository::StatsRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub pool_repository: Arc<dyn PoolRepository>,
    pub stats_repository: Arc<dyn StatsRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sports: Arc<dyn SportsDataProvider>,
    pub lifecycle: Arc<LifecycleService>,
    pub champions: Arc<ChampionsBook>,
    pub live_updates: LiveUpdatesHandle,
}

impl AppState {
    pub fn new(
        pool_repository: Arc<dyn PoolRepository>,
        stats_repository: Arc<dyn StatsRepository>,
        identity: Arc<dyn IdentityProvider>,
        sports: Arc<dyn SportsDataProvider>,
        champions: Arc<ChampionsBook>,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleService::new(
            Arc::clone(&pool_repository),
            Arc::clone(&stats_repository),
        ));
        Self {
            pool_repository,
            stats_repository,
            identity,
            sports,
            lifecycle,
            champions,
            live_updates: LiveUpdatesHandle::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Sports provider error: {0}")]
    Provider(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Provider(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Sports provider error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
