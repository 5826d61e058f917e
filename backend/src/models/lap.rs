//! Laps are derived once by the detector and never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::types::{LapId, SessionId, TrackId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    pub id: LapId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub lap_number: i32,
    /// Seconds between the window floor and the crossing fix.
    pub lap_time: f64,
    pub top_speed: f64,
    pub avg_speed: f64,
    /// Window floor, Unix epoch milliseconds.
    pub start_timestamp: i64,
    /// Crossing fix timestamp, Unix epoch milliseconds.
    pub end_timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl Lap {
    /// Leaderboard order. Equal lap times fall back to earliest completion,
    /// then lap id, so ranks are stable across calls.
    pub fn leaderboard_cmp(&self, other: &Lap) -> Ordering {
        self.lap_time
            .total_cmp(&other.lap_time)
            .then(self.end_timestamp.cmp(&other.end_timestamp))
            .then(self.id.cmp(&other.id))
    }
}

/// Keeps each user's fastest lap and returns them fastest first.
pub fn best_lap_per_user(laps: impl IntoIterator<Item = Lap>) -> Vec<Lap> {
    let mut best: HashMap<UserId, Lap> = HashMap::new();
    for lap in laps {
        match best.get(&lap.user_id) {
            Some(current) if current.leaderboard_cmp(&lap) != Ordering::Greater => {}
            _ => {
                best.insert(lap.user_id, lap);
            }
        }
    }

    let mut ranked: Vec<Lap> = best.into_values().collect();
    ranked.sort_by(Lap::leaderboard_cmp);
    ranked
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LapSummary {
    pub id: LapId,
    pub lap_number: i32,
    pub lap_time: f64,
    pub top_speed: f64,
    pub avg_speed: f64,
}

impl From<&Lap> for LapSummary {
    fn from(lap: &Lap) -> Self {
        Self {
            id: lap.id,
            lap_number: lap.lap_number,
            lap_time: lap.lap_time,
            top_speed: lap.top_speed,
            avg_speed: lap.avg_speed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LapResponse {
    pub id: LapId,
    pub session_id: SessionId,
    pub track_id: TrackId,
    pub lap_number: i32,
    pub lap_time: f64,
    pub top_speed: f64,
    pub avg_speed: f64,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub completed_at: DateTime<Utc>,
}

impl From<Lap> for LapResponse {
    fn from(lap: Lap) -> Self {
        Self {
            id: lap.id,
            session_id: lap.session_id,
            track_id: lap.track_id,
            lap_number: lap.lap_number,
            lap_time: lap.lap_time,
            top_speed: lap.top_speed,
            avg_speed: lap.avg_speed,
            start_timestamp: lap.start_timestamp,
            end_timestamp: lap.end_timestamp,
            completed_at: lap.created_at,
        }
    }
}
