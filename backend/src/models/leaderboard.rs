//! Read-model projections computed on demand from persisted laps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::lap::{Lap, LapResponse};
use crate::models::DEFAULT_PAGE_LIMIT;
use crate::types::{LapId, SessionId, TrackId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub lap_id: LapId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub lap_number: i32,
    pub lap_time: f64,
    pub top_speed: f64,
    pub avg_speed: f64,
    pub completed_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn ranked(rank: usize, lap: &Lap) -> Self {
        Self {
            rank,
            lap_id: lap.id,
            user_id: lap.user_id,
            session_id: lap.session_id,
            lap_number: lap.lap_number,
            lap_time: lap.lap_time,
            top_speed: lap.top_speed,
            avg_speed: lap.avg_speed,
            completed_at: lap.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: TrackId,
    pub name: String,
    pub distance: Option<f64>,
    pub activity_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackLeaderboardResponse {
    pub track: TrackSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLapEntry {
    pub lap_id: LapId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub session_id: SessionId,
    pub lap_number: i32,
    pub lap_time: f64,
    pub top_speed: f64,
    pub avg_speed: f64,
    pub completed_at: DateTime<Utc>,
}

impl From<Lap> for GlobalLapEntry {
    fn from(lap: Lap) -> Self {
        Self {
            lap_id: lap.id,
            user_id: lap.user_id,
            track_id: lap.track_id,
            session_id: lap.session_id,
            lap_number: lap.lap_number,
            lap_time: lap.lap_time,
            top_speed: lap.top_speed,
            avg_speed: lap.avg_speed,
            completed_at: lap.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlobalLeaderboardResponse {
    pub laps: Vec<GlobalLapEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionLapsResponse {
    pub session_id: SessionId,
    pub laps: Vec<LapResponse>,
    pub total: usize,
    pub best_lap: Option<LapResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserLapsResponse {
    pub user_id: UserId,
    pub laps: Vec<LapResponse>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackLeaderboardQuery {
    pub track_id: Option<TrackId>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserLapsQuery {
    pub track_id: Option<TrackId>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}
