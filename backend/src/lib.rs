use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;

use state::AppState;

/// Builds the HTTP router with shared layers over `state`.
pub fn build_app(state: AppState) -> Router {
    let telemetry_routes = Router::new()
        .route("/api/ingest", post(handlers::telemetry::ingest))
        .route(
            "/api/telemetry/{session_id}",
            get(handlers::telemetry::session_telemetry),
        );

    let leaderboard_routes = Router::new()
        .route(
            "/api/leaderboard",
            get(handlers::leaderboard::track_leaderboard),
        )
        .route(
            "/api/leaderboard/global",
            get(handlers::leaderboard::global_leaderboard),
        )
        .route(
            "/api/leaderboard/laps/session/{session_id}",
            get(handlers::leaderboard::session_laps),
        )
        .route(
            "/api/leaderboard/laps/user/{user_id}",
            get(handlers::leaderboard::user_laps),
        );

    let session_routes = Router::new()
        .route(
            "/api/sessions",
            get(handlers::sessions::list_sessions).post(handlers::sessions::create_session),
        )
        .route(
            "/api/sessions/{session_id}",
            get(handlers::sessions::get_session),
        )
        .route(
            "/api/sessions/{session_id}/stop",
            post(handlers::sessions::stop_session),
        );

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .merge(telemetry_routes)
        .merge(leaderboard_routes)
        .merge(session_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
