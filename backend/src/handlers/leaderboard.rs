use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::{
    error::AppError,
    handlers::{path_param, query_params},
    models::{
        leaderboard::{
            GlobalLeaderboardResponse, SessionLapsResponse, TrackLeaderboardQuery,
            TrackLeaderboardResponse, UserLapsQuery, UserLapsResponse,
        },
        PaginationQuery,
    },
    state::AppState,
    types::{SessionId, UserId},
};

pub async fn track_leaderboard(
    State(state): State<AppState>,
    query: Result<Query<TrackLeaderboardQuery>, QueryRejection>,
) -> Result<Json<TrackLeaderboardResponse>, AppError> {
    let query = query_params(query)?;
    let track_id = query
        .track_id
        .ok_or_else(|| AppError::BadRequest("trackId is required".into()))?;

    let board = state
        .leaderboard
        .track_leaderboard(track_id, query.limit, query.offset)
        .await?;
    Ok(Json(board))
}

pub async fn global_leaderboard(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<GlobalLeaderboardResponse>, AppError> {
    let query = query_params(query)?;
    let board = state
        .leaderboard
        .global(query.limit(), query.offset())
        .await?;
    Ok(Json(board))
}

pub async fn session_laps(
    State(state): State<AppState>,
    session_id: Result<Path<SessionId>, PathRejection>,
) -> Result<Json<SessionLapsResponse>, AppError> {
    let session_id = path_param(session_id)?;
    Ok(Json(state.leaderboard.session_laps(session_id).await?))
}

pub async fn user_laps(
    State(state): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
    query: Result<Query<UserLapsQuery>, QueryRejection>,
) -> Result<Json<UserLapsResponse>, AppError> {
    let user_id = path_param(user_id)?;
    let query = query_params(query)?;

    let laps = state
        .leaderboard
        .user_laps(user_id, query.track_id, query.limit, query.offset)
        .await?;
    Ok(Json(laps))
}
