//! Resolves where the current, unclosed lap of a session starts.

use std::sync::Arc;

use crate::error::AppError;
use crate::repositories::{LapRepositoryTrait, SessionRepositoryTrait};
use crate::types::SessionId;

/// Lower time bound of the live lap window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapWindow {
    /// Unix epoch milliseconds; points at or before this belong to a closed lap.
    pub floor_ms: i64,
    /// Highest lap number recorded so far, 0 when none.
    pub last_lap_number: i32,
}

impl LapWindow {
    pub fn next_lap_number(&self) -> i32 {
        self.last_lap_number + 1
    }
}

/// Reasons a session has no live window.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("session {0} has been stopped")]
    SessionStopped(SessionId),
    #[error("failed to load lap window: {0}")]
    Store(#[from] AppError),
}

#[derive(Clone)]
pub struct SessionWindowTracker {
    sessions: Arc<dyn SessionRepositoryTrait>,
    laps: Arc<dyn LapRepositoryTrait>,
}

impl SessionWindowTracker {
    pub fn new(sessions: Arc<dyn SessionRepositoryTrait>, laps: Arc<dyn LapRepositoryTrait>) -> Self {
        Self { sessions, laps }
    }

    /// Session start when no lap exists yet, otherwise the end of the lap with
    /// the highest lap number.
    pub async fn current_window(&self, session_id: SessionId) -> Result<LapWindow, WindowError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(WindowError::SessionNotFound(session_id))?;

        if !session.is_active() {
            return Err(WindowError::SessionStopped(session_id));
        }

        let window = match self.laps.latest_for_session(session_id).await? {
            Some(lap) => LapWindow {
                floor_ms: lap.end_timestamp,
                last_lap_number: lap.lap_number,
            },
            None => LapWindow {
                floor_ms: session.start_millis(),
                last_lap_number: 0,
            },
        };

        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lap::Lap;
    use crate::models::session::Session;
    use crate::repositories::InMemoryStore;
    use crate::types::{LapId, TrackId, UserId};
    use chrono::{TimeZone, Utc};

    fn tracker(store: &InMemoryStore) -> SessionWindowTracker {
        SessionWindowTracker::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn lap(session: &Session, lap_number: i32, end_timestamp: i64) -> Lap {
        Lap {
            id: LapId::new(),
            session_id: session.id,
            user_id: session.user_id,
            track_id: session.track_id,
            lap_number,
            lap_time: 1.0,
            top_speed: 0.0,
            avg_speed: 0.0,
            start_timestamp: end_timestamp - 1000,
            end_timestamp,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_lap_window_starts_at_session_start() {
        let store = InMemoryStore::new();
        let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let session = store.insert_session(Session::new(UserId::new(), TrackId::new(), start));

        let window = tracker(&store).current_window(session.id).await.expect("window");
        assert_eq!(window.floor_ms, 1_700_000_000_000);
        assert_eq!(window.next_lap_number(), 1);
    }

    #[tokio::test]
    async fn window_follows_highest_lap_number_not_insertion_order() {
        let store = InMemoryStore::new();
        let session = store.insert_session(Session::new(UserId::new(), TrackId::new(), Utc::now()));
        store.insert_lap(lap(&session, 2, 9_000));
        store.insert_lap(lap(&session, 1, 5_000));

        let window = tracker(&store).current_window(session.id).await.expect("window");
        assert_eq!(window.floor_ms, 9_000);
        assert_eq!(window.last_lap_number, 2);
    }

    #[tokio::test]
    async fn stopped_or_missing_sessions_are_not_ready() {
        let store = InMemoryStore::new();
        let mut stopped = Session::new(UserId::new(), TrackId::new(), Utc::now());
        stopped.end_time = Some(Utc::now());
        let stopped = store.insert_session(stopped);

        let tracker = tracker(&store);
        assert!(matches!(
            tracker.current_window(stopped.id).await,
            Err(WindowError::SessionStopped(_))
        ));
        assert!(matches!(
            tracker.current_window(SessionId::new()).await,
            Err(WindowError::SessionNotFound(_))
        ));
    }
}
