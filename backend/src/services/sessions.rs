//! Session lifecycle: start, stop, lookup.

use chrono::Utc;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::session::{
    Session, SessionListQuery, SessionListResponse, SessionResponse,
};
use crate::models::MAX_PAGE_LIMIT;
use crate::repositories::{SessionRepositoryTrait, TrackRepositoryTrait};
use crate::services::session_locks::SessionLocks;
use crate::types::{SessionId, TrackId, UserId};

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepositoryTrait>,
    tracks: Arc<dyn TrackRepositoryTrait>,
    locks: Arc<SessionLocks>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryTrait>,
        tracks: Arc<dyn TrackRepositoryTrait>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            sessions,
            tracks,
            locks,
        }
    }

    pub async fn start(&self, user_id: UserId, track_id: TrackId) -> Result<SessionResponse, AppError> {
        let track = self
            .tracks
            .find_by_id(track_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Track not found".into()))?;

        if self.sessions.find_active(user_id, track_id).await?.is_some() {
            return Err(AppError::Conflict(
                "You already have an active session for this track".into(),
            ));
        }

        let session = self
            .sessions
            .create(&Session::new(user_id, track_id, Utc::now()))
            .await?;

        tracing::info!(
            session_id = %session.id,
            user_id = %user_id,
            track_id = %track_id,
            "Session started"
        );

        Ok(SessionResponse::from_session(session, Some(track.name)))
    }

    /// Ends the session under its ingestion lock, so no batch straddles the
    /// stop.
    pub async fn stop(&self, user_id: UserId, session_id: SessionId) -> Result<SessionResponse, AppError> {
        let guard = self.locks.acquire(session_id).await;
        let result = self.stop_locked(user_id, session_id).await;
        drop(guard);
        self.locks.release_idle();
        result
    }

    async fn stop_locked(&self, user_id: UserId, session_id: SessionId) -> Result<SessionResponse, AppError> {
        let session = self.owned_session(user_id, session_id).await?;
        if !session.is_active() {
            return Err(AppError::Conflict("Session already stopped".into()));
        }

        let stopped = self
            .sessions
            .stop(session_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::Conflict("Session already stopped".into()))?;

        tracing::info!(
            session_id = %session_id,
            duration_seconds = stopped.duration_seconds(),
            "Session stopped"
        );

        let track_name = self.track_name(&stopped).await?;
        Ok(SessionResponse::from_session(stopped, track_name))
    }

    pub async fn get(&self, user_id: UserId, session_id: SessionId) -> Result<SessionResponse, AppError> {
        let session = self.owned_session(user_id, session_id).await?;
        let track_name = self.track_name(&session).await?;
        Ok(SessionResponse::from_session(session, track_name))
    }

    pub async fn list(
        &self,
        user_id: UserId,
        query: &SessionListQuery,
    ) -> Result<SessionListResponse, AppError> {
        let limit = query.limit.clamp(1, MAX_PAGE_LIMIT);
        let offset = query.offset.max(0);
        let sessions = self
            .sessions
            .list_for_user(user_id, query.status, limit, offset)
            .await?;

        let mut responses = Vec::with_capacity(sessions.len());
        for session in sessions {
            let track_name = self.track_name(&session).await?;
            responses.push(SessionResponse::from_session(session, track_name));
        }

        Ok(SessionListResponse {
            total: responses.len(),
            sessions: responses,
            limit,
            offset,
        })
    }

    async fn owned_session(&self, user_id: UserId, session_id: SessionId) -> Result<Session, AppError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        if session.user_id != user_id {
            return Err(AppError::Forbidden("Session belongs to another user".into()));
        }
        Ok(session)
    }

    async fn track_name(&self, session: &Session) -> Result<Option<String>, AppError> {
        Ok(self
            .tracks
            .find_by_id(session.track_id)
            .await?
            .map(|track| track.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::SessionStatus;
    use crate::models::track::{Track, Waypoint};
    use crate::repositories::InMemoryStore;

    fn service(store: &InMemoryStore) -> SessionService {
        SessionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(SessionLocks::new()),
        )
    }

    fn track(store: &InMemoryStore) -> Track {
        store.insert_track(Track::new(UserId::new(), "velodrome", vec![Waypoint::new(1.0, 1.0)]))
    }

    #[tokio::test]
    async fn second_active_session_conflicts() {
        let store = InMemoryStore::new();
        let track = track(&store);
        let service = service(&store);
        let user = UserId::new();

        let started = service.start(user, track.id).await.expect("start");
        assert_eq!(started.status, SessionStatus::Active);
        assert_eq!(started.track_name.as_deref(), Some("velodrome"));

        let err = service.start(user, track.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_track_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store).start(UserId::new(), TrackId::new()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn stop_is_owner_only_and_happens_once() {
        let store = InMemoryStore::new();
        let track = track(&store);
        let service = service(&store);
        let owner = UserId::new();
        let session = service.start(owner, track.id).await.expect("start");

        let err = service.stop(UserId::new(), session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stopped = service.stop(owner, session.id).await.expect("stop");
        assert_eq!(stopped.status, SessionStatus::Completed);
        assert!(stopped.duration.is_some());

        let err = service.stop(owner, session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new();
        let first = service.start(user, track(&store).id).await.expect("start");
        service.start(user, track(&store).id).await.expect("start");
        service.stop(user, first.id).await.expect("stop");

        let active = service
            .list(
                user,
                &SessionListQuery {
                    status: Some(SessionStatus::Active),
                    limit: 50,
                    offset: 0,
                },
            )
            .await
            .expect("list");
        assert_eq!(active.total, 1);
        assert_ne!(active.sessions[0].id, first.id);
    }
}
