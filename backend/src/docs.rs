#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    error::ErrorResponse,
    handlers::health::HealthResponse,
    models::{
        lap::{LapResponse, LapSummary},
        leaderboard::{
            GlobalLapEntry, GlobalLeaderboardResponse, LeaderboardEntry, SessionLapsResponse,
            TrackLeaderboardQuery, TrackLeaderboardResponse, TrackSummary, UserLapsQuery,
            UserLapsResponse,
        },
        session::{
            CreateSessionRequest, SessionListQuery, SessionListResponse, SessionResponse,
            SessionStatus,
        },
        telemetry::{
            IngestRequest, IngestResponse, TelemetryPage, TelemetryPoint, TelemetryPointInput,
            TelemetryQuery,
        },
        PaginationQuery,
    },
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        ingest_doc,
        session_telemetry_doc,
        track_leaderboard_doc,
        global_leaderboard_doc,
        session_laps_doc,
        user_laps_doc,
        create_session_doc,
        stop_session_doc,
        list_sessions_doc,
        get_session_doc
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            // telemetry
            IngestRequest,
            IngestResponse,
            TelemetryPointInput,
            TelemetryPoint,
            TelemetryPage,
            TelemetryQuery,
            // laps & leaderboards
            LapSummary,
            LapResponse,
            LeaderboardEntry,
            TrackSummary,
            TrackLeaderboardResponse,
            TrackLeaderboardQuery,
            GlobalLapEntry,
            GlobalLeaderboardResponse,
            SessionLapsResponse,
            UserLapsResponse,
            UserLapsQuery,
            PaginationQuery,
            // sessions
            CreateSessionRequest,
            SessionListQuery,
            SessionListResponse,
            SessionResponse,
            SessionStatus
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Telemetry", description = "GPS ingestion and session telemetry"),
        (name = "Leaderboard", description = "Leaderboards and lap history"),
        (name = "Sessions", description = "Session lifecycle"),
        (name = "Ops", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "UserId",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-user-id"))),
        );
    }
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, body = HealthResponse)),
    tag = "Ops"
)]
fn health_doc() {}

#[utoipa::path(
    post,
    path = "/api/ingest",
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Points stored; lap included when one closed", body = IngestResponse),
        (status = 400, description = "Invalid batch or track without waypoints", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 404, description = "Unknown session or track", body = ErrorResponse),
        (status = 409, description = "Session has been stopped", body = ErrorResponse)
    ),
    tag = "Telemetry",
    security((), ("UserId" = []))
)]
fn ingest_doc() {}

#[utoipa::path(
    get,
    path = "/api/telemetry/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session id"),
        TelemetryQuery
    ),
    responses(
        (status = 200, body = TelemetryPage),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Telemetry"
)]
fn session_telemetry_doc() {}

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    params(TrackLeaderboardQuery),
    responses(
        (status = 200, description = "Best lap per user, fastest first", body = TrackLeaderboardResponse),
        (status = 400, description = "trackId missing", body = ErrorResponse),
        (status = 404, description = "Unknown track", body = ErrorResponse)
    ),
    tag = "Leaderboard"
)]
fn track_leaderboard_doc() {}

#[utoipa::path(
    get,
    path = "/api/leaderboard/global",
    params(PaginationQuery),
    responses((status = 200, description = "Most recent laps", body = GlobalLeaderboardResponse)),
    tag = "Leaderboard"
)]
fn global_leaderboard_doc() {}

#[utoipa::path(
    get,
    path = "/api/leaderboard/laps/session/{session_id}",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, body = SessionLapsResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Leaderboard"
)]
fn session_laps_doc() {}

#[utoipa::path(
    get,
    path = "/api/leaderboard/laps/user/{user_id}",
    params(
        ("user_id" = String, Path, description = "User id"),
        UserLapsQuery
    ),
    responses((status = 200, body = UserLapsResponse)),
    tag = "Leaderboard"
)]
fn user_laps_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, body = SessionResponse),
        (status = 401, body = ErrorResponse),
        (status = 404, description = "Unknown track", body = ErrorResponse),
        (status = 409, description = "Active session already exists", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("UserId" = []))
)]
fn create_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/stop",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, body = SessionResponse),
        (status = 403, body = ErrorResponse),
        (status = 409, description = "Already stopped", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("UserId" = []))
)]
fn stop_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/sessions",
    params(SessionListQuery),
    responses((status = 200, body = SessionListResponse)),
    tag = "Sessions",
    security(("UserId" = []))
)]
fn list_sessions_doc() {}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, body = SessionResponse),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("UserId" = []))
)]
fn get_session_doc() {}
