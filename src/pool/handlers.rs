use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::instrument;

use super::repository::PoolRepository;
use super::service::PoolService;
use super::types::{
    complete_scorelines, CreatePoolRequest, PoolDetail, PoolSummary, PredictionRequest,
    ResultsRequest, StandingsResponse,
};
use crate::identity::{authenticate, require_admin};
use crate::shared::{AppError, AppState};

fn pool_service(state: &AppState) -> PoolService {
    PoolService::new(
        Arc::clone(&state.pool_repository),
        Arc::clone(&state.stats_repository),
    )
}

/// POST /pools (admin)
#[instrument(name = "create_pool", skip(state, headers, request))]
pub async fn create_pool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePoolRequest>,
) -> Result<Json<PoolDetail>, AppError> {
    require_admin(&state, &headers).await?;
    let pool = pool_service(&state).create_pool(request).await?;
    Ok(Json(pool.into()))
}

/// GET /pools
///
/// Admins see every pool; players only the active ones.
#[instrument(name = "list_pools", skip(state, headers))]
pub async fn list_pools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PoolSummary>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let pools = state.pool_repository.list_pools().await?;
    let summaries = pools
        .iter()
        .filter(|p| user.is_admin || p.is_active)
        .map(PoolSummary::from)
        .collect();
    Ok(Json(summaries))
}

/// GET /pools/:pool_id
#[instrument(name = "get_pool", skip(state, headers))]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PoolDetail>, AppError> {
    authenticate(&state, &headers).await?;
    let detail = pool_service(&state).detail(&pool_id).await?;
    Ok(Json(detail))
}

/// DELETE /pools/:pool_id (admin)
///
/// Goes through the lifecycle service so deletion holds the same
/// per-pool lock as close and reopen.
#[instrument(name = "delete_pool", skip(state, headers))]
pub async fn delete_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    state.lifecycle.delete(&pool_id).await?;
    Ok(Json(json!({ "deleted": pool_id })))
}

/// PUT /pools/:pool_id/prediction
///
/// Upserts the caller's prediction. Half-filled scoreline pairs are
/// silently dropped before validation.
#[instrument(name = "submit_prediction", skip(state, headers, request))]
pub async fn submit_prediction(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let scorelines = complete_scorelines(request.scorelines);
    let prediction = pool_service(&state)
        .submit_prediction(&pool_id, &user, scorelines)
        .await?;
    Ok(Json(json!({
        "pool_id": pool_id,
        "user_id": prediction.user_id,
        "matches": prediction.scorelines.len(),
    })))
}

/// GET /pools/:pool_id/prediction
#[instrument(name = "get_own_prediction", skip(state, headers))]
pub async fn get_own_prediction(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let user = authenticate(&state, &headers).await?;
    pool_service(&state).get_pool(&pool_id).await?;
    let prediction = state
        .pool_repository
        .get_prediction(&pool_id, &user.id)
        .await?;
    Ok(Json(json!({ "prediction": prediction })))
}

/// PUT /pools/:pool_id/results (admin)
///
/// Replaces the pool's actual results with the complete pairs of the
/// submitted form.
#[instrument(name = "set_results", skip(state, headers, request))]
pub async fn set_results(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ResultsRequest>,
) -> Result<Json<PoolDetail>, AppError> {
    require_admin(&state, &headers).await?;
    let results = complete_scorelines(request.results);
    let pool = pool_service(&state).set_results(&pool_id, results).await?;
    Ok(Json(pool.into()))
}

/// GET /pools/:pool_id/standings
#[instrument(name = "get_standings", skip(state, headers))]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(pool_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StandingsResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let table = pool_service(&state).standings(&pool_id, &user).await?;
    Ok(Json(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{CurrentUser, StaticTokenIdentity};
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{delete, get, post, put},
        Router,
    };
    use tower::ServiceExt;

    fn app() -> (AppState, Router) {
        let identity = Arc::new(StaticTokenIdentity::new());
        identity.register(
            "tok-alice",
            CurrentUser {
                id: "alice".to_string(),
                display_name: "Alice".to_string(),
                is_admin: false,
            },
        );
        identity.register(
            "tok-admin",
            CurrentUser {
                id: "admin".to_string(),
                display_name: "Admin".to_string(),
                is_admin: true,
            },
        );
        let state = AppStateBuilder::new().with_identity(identity).build();
        let router = Router::new()
            .route("/pools", post(create_pool).get(list_pools))
            .route("/pools/:pool_id", get(get_pool).delete(delete_pool))
            .route(
                "/pools/:pool_id/prediction",
                put(submit_prediction).get(get_own_prediction),
            )
            .route("/pools/:pool_id/results", put(set_results))
            .route("/pools/:pool_id/standings", get(get_standings))
            .with_state(state.clone());
        (state, router)
    }

    fn request(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const CREATE_BODY: &str = r#"{
        "name": "Jornada 1",
        "matches": [
            {"api_id": 327117, "home": "Colombia", "away": "Brasil", "championship": "Eliminatorias"}
        ]
    }"#;

    async fn create(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(request("POST", "/pools", "tok-admin", Some(CREATE_BODY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_requires_admin() {
        let (_, router) = app();
        let response = router
            .oneshot(request("POST", "/pools", "tok-alice", Some(CREATE_BODY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn players_only_see_active_pools() {
        let (state, router) = app();
        let pool_id = create(&router).await;

        let response = router
            .clone()
            .oneshot(request("GET", "/pools", "tok-alice", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 0);

        state
            .pool_repository
            .set_active(&pool_id, true)
            .await
            .unwrap();
        let response = router
            .oneshot(request("GET", "/pools", "tok-alice", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn prediction_round_trip() {
        let (_, router) = app();
        let pool_id = create(&router).await;

        let body = r#"{"scorelines": {"327117": {"home": 2, "away": 1}}}"#;
        let response = router
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/pools/{pool_id}/prediction"),
                "tok-alice",
                Some(body),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(request(
                "GET",
                &format!("/pools/{pool_id}/prediction"),
                "tok-alice",
                None,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["prediction"]["scorelines"]["327117"]["home"], 2);
    }

    #[tokio::test]
    async fn standings_forbidden_until_visible() {
        let (state, router) = app();
        let pool_id = create(&router).await;

        let response = router
            .clone()
            .oneshot(request(
                "GET",
                &format!("/pools/{pool_id}/standings"),
                "tok-alice",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        state
            .pool_repository
            .set_results_visible(&pool_id, true)
            .await
            .unwrap();
        let response = router
            .oneshot(request(
                "GET",
                &format!("/pools/{pool_id}/standings"),
                "tok-alice",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn results_form_drops_half_pairs() {
        let (state, router) = app();
        let pool_id = create(&router).await;

        let body = r#"{"results": {"327117": {"home": 1, "away": null}}}"#;
        let response = router
            .oneshot(request(
                "PUT",
                &format!("/pools/{pool_id}/results"),
                "tok-admin",
                Some(body),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let pool = state
            .pool_repository
            .get_pool(&pool_id)
            .await
            .unwrap()
            .unwrap();
        assert!(pool.real_results.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_pool_unless_closed() {
        let (state, router) = app();
        let pool_id = create(&router).await;

        state.pool_repository.mark_closed(&pool_id, vec![]).await.unwrap();
        let response = router
            .clone()
            .oneshot(request("DELETE", &format!("/pools/{pool_id}"), "tok-admin", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        state.pool_repository.mark_reopened(&pool_id).await.unwrap();
        let response = router
            .oneshot(request("DELETE", &format!("/pools/{pool_id}"), "tok-admin", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state
            .pool_repository
            .get_pool(&pool_id)
            .await
            .unwrap()
            .is_none());
    }
}
