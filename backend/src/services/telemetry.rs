//! Telemetry ingestion and read-back.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::lap::LapSummary;
use crate::models::telemetry::{
    IngestRequest, IngestResponse, NewTelemetryPoint, TelemetryPage, TelemetryQuery,
};
use crate::repositories::{SessionRepositoryTrait, TelemetryRepositoryTrait, TrackRepositoryTrait};
use crate::services::lap_detector::{DetectionOutcome, LapDetector};
use crate::services::session_locks::SessionLocks;
use crate::types::{SessionId, UserId};

pub const INGEST_SUCCESS_MESSAGE: &str = "Telemetry ingested successfully";

#[derive(Clone)]
pub struct TelemetryService {
    sessions: Arc<dyn SessionRepositoryTrait>,
    tracks: Arc<dyn TrackRepositoryTrait>,
    telemetry: Arc<dyn TelemetryRepositoryTrait>,
    detector: LapDetector,
    locks: Arc<SessionLocks>,
}

impl TelemetryService {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryTrait>,
        tracks: Arc<dyn TrackRepositoryTrait>,
        telemetry: Arc<dyn TelemetryRepositoryTrait>,
        detector: LapDetector,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            sessions,
            tracks,
            telemetry,
            detector,
            locks,
        }
    }

    /// Stores a batch and runs one detection pass over the live window.
    ///
    /// Lap detection problems are logged and never fail the call once points
    /// have been written.
    pub async fn ingest(
        &self,
        request: IngestRequest,
        caller: Option<UserId>,
    ) -> Result<IngestResponse, AppError> {
        let session_id = request
            .session_id
            .ok_or_else(|| AppError::BadRequest("sessionId is required".into()))?;

        let guard = self.locks.acquire(session_id).await;
        let result = self.ingest_locked(session_id, &request, caller).await;
        drop(guard);
        self.locks.release_idle();

        result
    }

    async fn ingest_locked(
        &self,
        session_id: SessionId,
        request: &IngestRequest,
        caller: Option<UserId>,
    ) -> Result<IngestResponse, AppError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        if let Some(caller) = caller {
            if caller != session.user_id {
                return Err(AppError::Forbidden(
                    "Session belongs to another user".into(),
                ));
            }
        }

        if !session.is_active() {
            return Err(AppError::Conflict("Session has been stopped".into()));
        }

        let track = self
            .tracks
            .find_by_id(session.track_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Track not found".into()))?;

        let finish_line = track
            .finish_line()
            .ok_or_else(|| AppError::BadRequest("Track has no waypoints defined".into()))?;

        let mut accepted: Vec<NewTelemetryPoint> = Vec::with_capacity(request.points.len());
        let mut rejected = 0usize;
        for (index, input) in request.points.iter().enumerate() {
            match input.to_new_point() {
                Ok(point) => accepted.push(point),
                Err(err) => {
                    rejected += 1;
                    tracing::debug!(
                        session_id = %session_id,
                        index,
                        error = %err,
                        "Dropping invalid telemetry point"
                    );
                }
            }
        }

        let inserted = if accepted.is_empty() {
            Vec::new()
        } else {
            self.telemetry.append(session_id, &accepted).await?
        };

        let lap = match self.detector.detect(&session, finish_line, &inserted).await {
            DetectionOutcome::Detected(lap) => Some(lap),
            DetectionOutcome::NotDetected => None,
            DetectionOutcome::Failed(err) => {
                tracing::error!(
                    session_id = %session_id,
                    error = %err,
                    "Lap detection failed"
                );
                None
            }
        };

        tracing::debug!(
            session_id = %session_id,
            ingested = inserted.len(),
            rejected,
            lap_detected = lap.is_some(),
            "Telemetry batch stored"
        );

        Ok(IngestResponse {
            message: INGEST_SUCCESS_MESSAGE.to_string(),
            points_ingested: inserted.len(),
            points_rejected: rejected,
            lap_detected: lap.is_some(),
            lap: lap.as_ref().map(LapSummary::from),
        })
    }

    pub async fn session_points(
        &self,
        session_id: SessionId,
        query: &TelemetryQuery,
    ) -> Result<TelemetryPage, AppError> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        let limit = query.limit();
        let offset = query.offset();
        let points = self.telemetry.list(session_id, limit, offset).await?;
        let total = self.telemetry.count(session_id).await?;

        Ok(TelemetryPage {
            session_id,
            points,
            total,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LapDetectionConfig;
    use crate::models::session::Session;
    use crate::models::telemetry::{TelemetryPoint, TelemetryPointInput};
    use crate::models::track::{Track, Waypoint};
    use crate::repositories::{InMemoryStore, LapRepositoryTrait, MockTelemetryRepositoryTrait};
    use crate::services::lap_events::ChannelLapEventSink;
    use crate::services::session_window::SessionWindowTracker;
    use chrono::{TimeZone, Utc};

    const START_MS: i64 = 1_700_000_000_000;

    fn service_with(store: &InMemoryStore, telemetry: Arc<dyn TelemetryRepositoryTrait>) -> TelemetryService {
        let laps: Arc<dyn LapRepositoryTrait> = Arc::new(store.clone());
        let (sink, _events) = ChannelLapEventSink::channel();
        let detector = LapDetector::new(
            telemetry.clone(),
            laps.clone(),
            SessionWindowTracker::new(Arc::new(store.clone()), laps),
            Arc::new(sink),
            LapDetectionConfig::default(),
        );
        TelemetryService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            telemetry,
            detector,
            Arc::new(SessionLocks::new()),
        )
    }

    fn seeded(waypoints: Vec<Waypoint>) -> (InMemoryStore, Session) {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let track = store.insert_track(Track::new(user, "harbor loop", waypoints));
        let start = Utc.timestamp_millis_opt(START_MS).unwrap();
        let session = store.insert_session(Session::new(user, track.id, start));
        (store, session)
    }

    fn input(lat: f64, lng: f64, timestamp: i64) -> TelemetryPointInput {
        TelemetryPointInput {
            lat: Some(lat),
            lng: Some(lng),
            speed: Some(12.0),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    fn request(session_id: SessionId, points: Vec<TelemetryPointInput>) -> IngestRequest {
        IngestRequest {
            session_id: Some(session_id),
            points,
        }
    }

    #[tokio::test]
    async fn invalid_points_are_counted_not_stored() {
        let (store, session) = seeded(vec![Waypoint::new(0.0, 0.0)]);
        let service = service_with(&store, Arc::new(store.clone()));

        let response = service
            .ingest(
                request(
                    session.id,
                    vec![input(10.0, 10.0, START_MS + 1), input(91.0, 10.0, START_MS + 2)],
                ),
                None,
            )
            .await
            .expect("ingest");

        assert_eq!(response.points_ingested, 1);
        assert_eq!(response.points_rejected, 1);
        assert!(!response.lap_detected);
        assert_eq!(store.points().len(), 1);
    }

    #[tokio::test]
    async fn foreign_caller_is_forbidden() {
        let (store, session) = seeded(vec![Waypoint::new(0.0, 0.0)]);
        let service = service_with(&store, Arc::new(store.clone()));

        let err = service
            .ingest(
                request(session.id, vec![input(1.0, 1.0, START_MS + 1)]),
                Some(UserId::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(store.points().is_empty());
    }

    #[tokio::test]
    async fn track_without_waypoints_is_rejected_before_write() {
        let (store, session) = seeded(Vec::new());
        let service = service_with(&store, Arc::new(store.clone()));

        let err = service
            .ingest(request(session.id, vec![input(1.0, 1.0, START_MS + 1)]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref message) if message == "Track has no waypoints defined"));
        assert!(store.points().is_empty());
    }

    #[tokio::test]
    async fn append_failure_fails_the_call() {
        let (store, session) = seeded(vec![Waypoint::new(0.0, 0.0)]);
        let mut telemetry = MockTelemetryRepositoryTrait::new();
        telemetry
            .expect_append()
            .returning(|_, _| Err(AppError::InternalServerError(anyhow::anyhow!("disk full"))));
        let service = service_with(&store, Arc::new(telemetry));

        let err = service
            .ingest(request(session.id, vec![input(1.0, 1.0, START_MS + 1)]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[tokio::test]
    async fn detection_failure_keeps_stored_points() {
        let (store, session) = seeded(vec![Waypoint::new(0.0, 0.0)]);
        let mut telemetry = MockTelemetryRepositoryTrait::new();
        telemetry
            .expect_append()
            .returning(|session_id, batch| Ok(stored_points(session_id, batch)));
        telemetry
            .expect_recent()
            .returning(|_, _| Err(AppError::InternalServerError(anyhow::anyhow!("timeout"))));
        let service = service_with(&store, Arc::new(telemetry));

        let response = service
            .ingest(request(session.id, vec![input(0.0, 0.0, START_MS + 1)]), None)
            .await
            .expect("ingest succeeds despite detector failure");

        assert_eq!(response.points_ingested, 1);
        assert!(!response.lap_detected);
    }

    fn stored_points(
        session_id: SessionId,
        batch: &[NewTelemetryPoint],
    ) -> Vec<TelemetryPoint> {
        batch
            .iter()
            .enumerate()
            .map(|(i, point)| TelemetryPoint {
                id: i as i64 + 1,
                session_id,
                lat: point.lat,
                lng: point.lng,
                speed: point.speed,
                altitude: point.altitude,
                accuracy: point.accuracy,
                timestamp: point.timestamp,
            })
            .collect()
    }

    #[tokio::test]
    async fn unknown_session_telemetry_is_not_found() {
        let (store, _) = seeded(vec![Waypoint::new(0.0, 0.0)]);
        let service = service_with(&store, Arc::new(store.clone()));

        let err = service
            .session_points(
                SessionId::new(),
                &TelemetryQuery {
                    limit: 10,
                    offset: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
