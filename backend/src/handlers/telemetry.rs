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
    middleware::MaybeUser,
    models::telemetry::{IngestRequest, IngestResponse, TelemetryPage, TelemetryQuery},
    state::AppState,
    types::SessionId,
};

pub async fn ingest(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let response = state.telemetry.ingest(request, caller).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn session_telemetry(
    State(state): State<AppState>,
    session_id: Result<Path<SessionId>, PathRejection>,
    query: Result<Query<TelemetryQuery>, QueryRejection>,
) -> Result<Json<TelemetryPage>, AppError> {
    let session_id = path_param(session_id)?;
    let query = query_params(query)?;

    let page = state.telemetry.session_points(session_id, &query).await?;
    Ok(Json(page))
}
