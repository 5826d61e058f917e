//! Read-only access to the track catalog.
//!
//! Tracks are created and edited elsewhere; the lap engine only needs the
//! course polyline in order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::track::{Track, Waypoint};
use crate::types::{TrackId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: TrackId) -> Result<Option<Track>, AppError>;
}

#[derive(Debug, FromRow)]
struct TrackRow {
    id: TrackId,
    creator_id: UserId,
    name: String,
    distance: Option<f64>,
    activity_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct WaypointRow {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepositoryTrait for TrackRepository {
    async fn find_by_id(&self, id: TrackId) -> Result<Option<Track>, AppError> {
        let Some(row) = sqlx::query_as::<_, TrackRow>(
            "SELECT id, creator_id, name, distance, activity_type, created_at FROM tracks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let waypoints = sqlx::query_as::<_, WaypointRow>(
            "SELECT lat, lng FROM track_waypoints WHERE track_id = $1 ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|wp| Waypoint::new(wp.lat, wp.lng))
        .collect();

        Ok(Some(Track {
            id: row.id,
            creator_id: row.creator_id,
            name: row.name,
            distance: row.distance,
            activity_type: row.activity_type,
            waypoints,
            created_at: row.created_at,
        }))
    }
}
