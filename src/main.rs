use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiniela::champions::{self, ChampionsBook};
use quiniela::identity::{CurrentUser, StaticTokenIdentity};
use quiniela::lifecycle;
use quiniela::pool::{self, repository::InMemoryPoolRepository};
use quiniela::shared::AppState;
use quiniela::sports::{
    self, start_live_updates_task, DisabledSportsProvider, FootballDataClient, PollerConfig,
    SportsDataProvider,
};
use quiniela::stats::{self, InMemoryStatsRepository};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiniela=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting quiniela server");

    let pool_repository = Arc::new(InMemoryPoolRepository::new());
    let stats_repository = Arc::new(InMemoryStatsRepository::new());

    let identity = Arc::new(StaticTokenIdentity::new());
    if let Ok(admin_token) = std::env::var("ADMIN_TOKEN") {
        identity.register(
            &admin_token,
            CurrentUser {
                id: "admin".to_string(),
                display_name: "Admin".to_string(),
                is_admin: true,
            },
        );
    } else {
        warn!("ADMIN_TOKEN not set, no admin access configured");
    }

    // Without an API key there is nothing to poll: install a provider
    // that reports itself unavailable and keep the poller unspawned.
    let (sports_provider, live_polling): (Arc<dyn SportsDataProvider>, bool) =
        match std::env::var("FOOTBALL_DATA_API_KEY") {
            Ok(api_key) => (Arc::new(FootballDataClient::new(api_key)), true),
            Err(_) => {
                warn!("FOOTBALL_DATA_API_KEY not set, live results and fixtures disabled");
                (Arc::new(DisabledSportsProvider), false)
            }
        };

    let app_state = AppState::new(
        pool_repository.clone(),
        stats_repository,
        identity,
        Arc::clone(&sports_provider),
        Arc::new(ChampionsBook::default_roster()),
    );

    if live_polling {
        let poll_interval = std::env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| PollerConfig::default().poll_interval);
        tokio::spawn(start_live_updates_task(
            pool_repository,
            sports_provider,
            app_state.live_updates.clone(),
            PollerConfig { poll_interval },
        ));
    }

    let app = Router::new()
        .route(
            "/pools",
            post(pool::handlers::create_pool).get(pool::handlers::list_pools),
        )
        .route(
            "/pools/:pool_id",
            get(pool::handlers::get_pool).delete(pool::handlers::delete_pool),
        )
        .route(
            "/pools/:pool_id/prediction",
            put(pool::handlers::submit_prediction).get(pool::handlers::get_own_prediction),
        )
        .route("/pools/:pool_id/results", put(pool::handlers::set_results))
        .route("/pools/:pool_id/standings", get(pool::handlers::get_standings))
        .route("/pools/:pool_id/active", put(lifecycle::handlers::set_active))
        .route("/pools/:pool_id/locked", put(lifecycle::handlers::set_locked))
        .route(
            "/pools/:pool_id/results-visible",
            put(lifecycle::handlers::set_results_visible),
        )
        .route("/pools/:pool_id/close", post(lifecycle::handlers::close_pool))
        .route("/pools/:pool_id/reopen", post(lifecycle::handlers::reopen_pool))
        .route("/profile/:user_id", get(stats::handlers::get_profile))
        .route("/leaderboard", get(stats::handlers::get_leaderboard))
        .route("/leaderboard/:user_id", put(stats::handlers::set_wins))
        .route("/champions", get(champions::handlers::get_champions))
        .route(
            "/fixtures/:competition_id",
            get(sports::handlers::list_fixtures),
        )
        .route("/live-updates", put(sports::handlers::set_live_updates))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind listen address");
    info!(addr = %bind_addr, "Server running");
    axum::serve(listener, app).await.expect("server error");
}
