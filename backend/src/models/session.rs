//! Sessions scope one user's timed run on one track.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::DEFAULT_PAGE_LIMIT;
use crate::types::{SessionId, TrackId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub start_time: DateTime<Utc>,
    /// Set once when the session is stopped; `None` while active.
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, track_id: TrackId, start_time: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            track_id,
            start_time,
            end_time: None,
            created_at: start_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_active() {
            SessionStatus::Active
        } else {
            SessionStatus::Completed
        }
    }

    /// Session start as Unix epoch milliseconds, the unit telemetry timestamps use.
    pub fn start_millis(&self) -> i64 {
        self.start_time.timestamp_millis()
    }

    /// Elapsed seconds between start and stop, once stopped.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[validate(required)]
    pub track_id: Option<TrackId>,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct SessionListQuery {
    pub status: Option<SessionStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub track_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn from_session(session: Session, track_name: Option<String>) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            track_id: session.track_id,
            track_name,
            start_time: session.start_time,
            end_time: session.end_time,
            duration: session.duration_seconds(),
            status: session.status(),
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_session_is_active_without_duration() {
        let session = Session::new(UserId::new(), TrackId::new(), Utc::now());
        assert!(session.is_active());
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.duration_seconds().is_none());
    }

    #[test]
    fn stopped_session_reports_duration_in_seconds() {
        let start = Utc::now();
        let mut session = Session::new(UserId::new(), TrackId::new(), start);
        session.end_time = Some(start + Duration::milliseconds(90_500));
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.duration_seconds(), Some(90.5));
    }

    #[test]
    fn create_request_requires_track_id() {
        let request: CreateSessionRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(request.validate().is_err());
    }
}
