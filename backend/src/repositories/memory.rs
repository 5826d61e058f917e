//! In-memory implementation of every repository trait.
//!
//! Mirrors the Postgres constraints that the lap engine relies on (one active
//! session per user and track, unique lap number per session) so services can
//! be exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::AppError;
use crate::models::lap::{best_lap_per_user, Lap};
use crate::models::session::{Session, SessionStatus};
use crate::models::telemetry::{NewTelemetryPoint, TelemetryPoint};
use crate::models::track::Track;
use crate::repositories::{
    LapRepositoryTrait, SessionRepositoryTrait, TelemetryRepositoryTrait, TrackRepositoryTrait,
};
use crate::types::{SessionId, TrackId, UserId};

#[derive(Debug, Default)]
struct StoreState {
    tracks: HashMap<TrackId, Track>,
    sessions: Vec<Session>,
    points: Vec<TelemetryPoint>,
    laps: Vec<Lap>,
    next_point_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds a track, standing in for the external track catalog.
    pub fn insert_track(&self, track: Track) -> Track {
        self.lock().tracks.insert(track.id, track.clone());
        track
    }

    /// Seeds a session without the active-session check.
    pub fn insert_session(&self, session: Session) -> Session {
        self.lock().sessions.push(session.clone());
        session
    }

    /// Seeds a lap without the lap-number claim check.
    pub fn insert_lap(&self, lap: Lap) -> Lap {
        self.lock().laps.push(lap.clone());
        lap
    }

    pub fn laps(&self) -> Vec<Lap> {
        self.lock().laps.clone()
    }

    pub fn points(&self) -> Vec<TelemetryPoint> {
        self.lock().points.clone()
    }
}

fn page<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl SessionRepositoryTrait for InMemoryStore {
    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        let mut state = self.lock();
        let duplicate = state.sessions.iter().any(|existing| {
            existing.user_id == session.user_id
                && existing.track_id == session.track_id
                && existing.is_active()
        });
        if duplicate && session.is_active() {
            return Err(AppError::Conflict(
                "You already have an active session for this track".into(),
            ));
        }
        state.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        Ok(self.lock().sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn find_active(
        &self,
        user_id: UserId,
        track_id: TrackId,
    ) -> Result<Option<Session>, AppError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.track_id == track_id && s.is_active())
            .cloned())
    }

    async fn stop(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        let mut state = self.lock();
        let Some(session) = state
            .sessions
            .iter_mut()
            .find(|s| s.id == id && s.is_active())
        else {
            return Ok(None);
        };
        session.end_time = Some(end_time);
        Ok(Some(session.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Session>, AppError> {
        let state = self.lock();
        let mut sessions: Vec<Session> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| status.map_or(true, |wanted| s.status() == wanted))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(page(sessions.into_iter(), limit, offset))
    }
}

#[async_trait]
impl TrackRepositoryTrait for InMemoryStore {
    async fn find_by_id(&self, id: TrackId) -> Result<Option<Track>, AppError> {
        Ok(self.lock().tracks.get(&id).cloned())
    }
}

#[async_trait]
impl TelemetryRepositoryTrait for InMemoryStore {
    async fn append(
        &self,
        session_id: SessionId,
        points: &[NewTelemetryPoint],
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let mut state = self.lock();
        let mut inserted = Vec::with_capacity(points.len());
        for point in points {
            state.next_point_id += 1;
            let stored = TelemetryPoint {
                id: state.next_point_id,
                session_id,
                lat: point.lat,
                lng: point.lng,
                speed: point.speed,
                altitude: point.altitude,
                accuracy: point.accuracy,
                timestamp: point.timestamp,
            };
            state.points.push(stored.clone());
            inserted.push(stored);
        }
        Ok(inserted)
    }

    async fn recent(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let mut points = session_points(&self.lock(), session_id);
        let keep = limit.max(0) as usize;
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }
        Ok(points)
    }

    async fn list(
        &self,
        session_id: SessionId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let points = session_points(&self.lock(), session_id);
        Ok(page(points.into_iter(), limit, offset))
    }

    async fn count(&self, session_id: SessionId) -> Result<i64, AppError> {
        let state = self.lock();
        Ok(state
            .points
            .iter()
            .filter(|p| p.session_id == session_id)
            .count() as i64)
    }
}

fn session_points(state: &StoreState, session_id: SessionId) -> Vec<TelemetryPoint> {
    let mut points: Vec<TelemetryPoint> = state
        .points
        .iter()
        .filter(|p| p.session_id == session_id)
        .cloned()
        .collect();
    points.sort_by_key(|p| (p.timestamp, p.id));
    points
}

fn track_laps(state: &StoreState, track_id: TrackId) -> impl Iterator<Item = Lap> + '_ {
    state
        .laps
        .iter()
        .filter(move |lap| lap.track_id == track_id)
        .cloned()
}

#[async_trait]
impl LapRepositoryTrait for InMemoryStore {
    async fn latest_for_session(&self, session_id: SessionId) -> Result<Option<Lap>, AppError> {
        Ok(self
            .lock()
            .laps
            .iter()
            .filter(|lap| lap.session_id == session_id)
            .max_by_key(|lap| lap.lap_number)
            .cloned())
    }

    async fn create(&self, lap: &Lap) -> Result<Lap, AppError> {
        let mut state = self.lock();
        let taken = state
            .laps
            .iter()
            .any(|existing| existing.session_id == lap.session_id && existing.lap_number == lap.lap_number);
        if taken {
            return Err(AppError::Conflict(
                "Duplicate record violates laps_session_lap_number_key".into(),
            ));
        }
        state.laps.push(lap.clone());
        Ok(lap.clone())
    }

    async fn list_for_session(&self, session_id: SessionId) -> Result<Vec<Lap>, AppError> {
        let mut laps: Vec<Lap> = self
            .lock()
            .laps
            .iter()
            .filter(|lap| lap.session_id == session_id)
            .cloned()
            .collect();
        laps.sort_by_key(|lap| lap.lap_number);
        Ok(laps)
    }

    async fn best_for_track(
        &self,
        track_id: TrackId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError> {
        let best = best_lap_per_user(track_laps(&self.lock(), track_id));
        Ok(page(best.into_iter(), limit, offset))
    }

    async fn count_ranked_users(&self, track_id: TrackId) -> Result<i64, AppError> {
        let users: HashSet<UserId> = track_laps(&self.lock(), track_id)
            .map(|lap| lap.user_id)
            .collect();
        Ok(users.len() as i64)
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Lap>, AppError> {
        let mut laps: Vec<Lap> = self.lock().laps.iter().rev().cloned().collect();
        laps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(laps.into_iter(), limit, offset))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        track_id: Option<TrackId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError> {
        let mut laps: Vec<Lap> = self
            .lock()
            .laps
            .iter()
            .rev()
            .filter(|lap| lap.user_id == user_id)
            .filter(|lap| track_id.map_or(true, |id| lap.track_id == id))
            .cloned()
            .collect();
        laps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(laps.into_iter(), limit, offset))
    }
}
