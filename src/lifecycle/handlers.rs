use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::CloseOutcome;
use crate::identity::require_admin;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub value: bool,
}

/// PUT /pools/:id/active (admin)
#[instrument(name = "set_pool_active", skip(state, headers))]
pub async fn set_active(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<FlagRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    state.lifecycle.set_active(&pool_id, request.value).await?;
    Ok(Json(json!({ "pool_id": pool_id, "is_active": request.value })))
}

/// PUT /pools/:id/locked (admin)
#[instrument(name = "set_pool_locked", skip(state, headers))]
pub async fn set_locked(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<FlagRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    state.lifecycle.set_locked(&pool_id, request.value).await?;
    Ok(Json(json!({ "pool_id": pool_id, "locked": request.value })))
}

/// PUT /pools/:id/results-visible (admin)
#[instrument(name = "set_pool_results_visible", skip(state, headers))]
pub async fn set_results_visible(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<FlagRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    state
        .lifecycle
        .set_results_visible(&pool_id, request.value)
        .await?;
    Ok(Json(
        json!({ "pool_id": pool_id, "results_visible": request.value }),
    ))
}

/// POST /pools/:id/close (admin)
///
/// Scores the pool, persists the winners snapshot and applies all
/// lifetime counter and leaderboard mutations.
#[instrument(name = "close_pool", skip(state, headers))]
pub async fn close_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CloseOutcome>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    info!(pool_id = %pool_id, admin = %admin.id, "Admin closing pool");

    let outcome = state.lifecycle.close(&pool_id).await?;
    Ok(Json(outcome))
}

/// POST /pools/:id/reopen (admin)
#[instrument(name = "reopen_pool", skip(state, headers))]
pub async fn reopen_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    info!(pool_id = %pool_id, admin = %admin.id, "Admin reopening pool");

    state.lifecycle.reopen(&pool_id).await?;
    Ok(Json(json!({ "pool_id": pool_id, "is_closed": false })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{CurrentUser, StaticTokenIdentity};
    use crate::pool::models::{Match, Pool, Prediction};
    use crate::pool::repository::{InMemoryPoolRepository, PoolRepository};
    use crate::scoring::Scoreline;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{post, put},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn seeded_state() -> (AppState, String) {
        let pools = Arc::new(InMemoryPoolRepository::new());
        let identity = Arc::new(StaticTokenIdentity::new());
        identity.register(
            "tok-admin",
            CurrentUser {
                id: "admin".to_string(),
                display_name: "Admin".to_string(),
                is_admin: true,
            },
        );
        identity.register(
            "tok-bob",
            CurrentUser {
                id: "bob".to_string(),
                display_name: "Bob".to_string(),
                is_admin: false,
            },
        );

        let pool = Pool::new(
            "Jornada 1".to_string(),
            vec![Match::manual("m1", "A", "B", "Cup")],
        );
        pools.create_pool(&pool).await.unwrap();
        pools
            .upsert_prediction(
                &pool.id,
                Prediction::new(
                    "bob".to_string(),
                    "Bob".to_string(),
                    [("m1".to_string(), Scoreline::new(1, 0))].into(),
                ),
            )
            .await
            .unwrap();
        pools
            .set_results(&pool.id, [("m1".to_string(), Scoreline::new(1, 0))].into())
            .await
            .unwrap();

        let state = AppStateBuilder::new()
            .with_pool_repository(pools)
            .with_identity(identity)
            .build();
        (state, pool.id)
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/pools/:id/close", post(close_pool))
            .route("/pools/:id/reopen", post(reopen_pool))
            .route("/pools/:id/locked", put(set_locked))
            .with_state(state)
    }

    fn request(method: &str, uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn close_endpoint_returns_winners() {
        let (state, pool_id) = seeded_state().await;
        let app = app(state);

        let response = app
            .oneshot(request(
                "POST",
                &format!("/pools/{pool_id}/close"),
                "tok-admin",
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let outcome: CloseOutcome = serde_json::from_slice(&body).unwrap();
        assert_eq!(outcome.max_score, 6);
        assert_eq!(outcome.winners[0].user_id, "bob");
    }

    #[tokio::test]
    async fn close_requires_admin() {
        let (state, pool_id) = seeded_state().await;
        let app = app(state);

        let response = app
            .oneshot(request(
                "POST",
                &format!("/pools/{pool_id}/close"),
                "tok-bob",
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn double_close_conflicts() {
        let (state, pool_id) = seeded_state().await;
        let app = app(state);

        let first = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/pools/{pool_id}/close"),
                "tok-admin",
                "",
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(request(
                "POST",
                &format!("/pools/{pool_id}/close"),
                "tok-admin",
                "",
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn lock_flag_toggles() {
        let (state, pool_id) = seeded_state().await;
        let pools = Arc::clone(&state.pool_repository);
        let app = app(state);

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/pools/{pool_id}/locked"),
                "tok-admin",
                r#"{"value": true}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(pools.get_pool(&pool_id).await.unwrap().unwrap().locked);
    }
}
