//! Track polyline as consumed by the lap engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{TrackId, UserId};

/// A fixed course coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub creator_id: UserId,
    pub name: String,
    /// Course length in meters, when the catalog knows it.
    pub distance: Option<f64>,
    pub activity_type: String,
    /// Waypoints in course order; index 0 is the finish line.
    pub waypoints: Vec<Waypoint>,
    pub created_at: DateTime<Utc>,
}

impl Track {
    pub fn new(creator_id: UserId, name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            id: TrackId::new(),
            creator_id,
            name: name.into(),
            distance: None,
            activity_type: "running".to_string(),
            waypoints,
            created_at: Utc::now(),
        }
    }

    pub fn finish_line(&self) -> Option<Waypoint> {
        self.waypoints.first().copied()
    }
}
