use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{json_body, path_param, query_params},
    middleware::CurrentUser,
    models::session::{CreateSessionRequest, SessionListQuery, SessionListResponse, SessionResponse},
    state::AppState,
    types::SessionId,
};

pub async fn create_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;
    let track_id = request
        .track_id
        .ok_or_else(|| AppError::BadRequest("trackId is required".into()))?;

    let session = state.sessions.start(user_id, track_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn stop_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    session_id: Result<Path<SessionId>, PathRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let session_id = path_param(session_id)?;
    Ok(Json(state.sessions.stop(user_id, session_id).await?))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<SessionListQuery>, QueryRejection>,
) -> Result<Json<SessionListResponse>, AppError> {
    let query = query_params(query)?;
    Ok(Json(state.sessions.list(user_id, &query).await?))
}

pub async fn get_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    session_id: Result<Path<SessionId>, PathRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let session_id = path_param(session_id)?;
    Ok(Json(state.sessions.get(user_id, session_id).await?))
}
