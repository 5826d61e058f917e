//! Finish-line lap detection over the live lap window.

use chrono::Utc;
use std::sync::Arc;

use crate::config::LapDetectionConfig;
use crate::error::AppError;
use crate::models::lap::Lap;
use crate::models::session::Session;
use crate::models::telemetry::TelemetryPoint;
use crate::models::track::Waypoint;
use crate::repositories::{LapRepositoryTrait, TelemetryRepositoryTrait};
use crate::services::geodesic;
use crate::services::lap_events::{dispatch_lap_completed, LapCompletedEvent, LapEventSink};
use crate::services::session_window::{SessionWindowTracker, WindowError};
use crate::services::speed::SpeedSummary;
use crate::types::LapId;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("lap store failure: {0}")]
    Store(#[from] AppError),
}

/// Result of one detection pass. Failures are reported, never raised, so the
/// caller can keep the already stored telemetry.
#[derive(Debug)]
pub enum DetectionOutcome {
    Detected(Lap),
    NotDetected,
    Failed(DetectionError),
}

impl DetectionOutcome {
    pub fn lap(&self) -> Option<&Lap> {
        match self {
            DetectionOutcome::Detected(lap) => Some(lap),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct LapDetector {
    telemetry: Arc<dyn TelemetryRepositoryTrait>,
    laps: Arc<dyn LapRepositoryTrait>,
    windows: SessionWindowTracker,
    events: Arc<dyn LapEventSink>,
    config: LapDetectionConfig,
}

impl LapDetector {
    pub fn new(
        telemetry: Arc<dyn TelemetryRepositoryTrait>,
        laps: Arc<dyn LapRepositoryTrait>,
        windows: SessionWindowTracker,
        events: Arc<dyn LapEventSink>,
        config: LapDetectionConfig,
    ) -> Self {
        Self {
            telemetry,
            laps,
            windows,
            events,
            config,
        }
    }

    pub fn config(&self) -> &LapDetectionConfig {
        &self.config
    }

    /// Closes at most one lap for `session` after `new_points` were stored.
    /// Callers must hold the session lock.
    pub async fn detect(
        &self,
        session: &Session,
        finish_line: Waypoint,
        new_points: &[TelemetryPoint],
    ) -> DetectionOutcome {
        if new_points.is_empty() {
            return DetectionOutcome::NotDetected;
        }

        match self.try_detect(session, finish_line).await {
            Ok(Some(lap)) => DetectionOutcome::Detected(lap),
            Ok(None) => DetectionOutcome::NotDetected,
            Err(err) => DetectionOutcome::Failed(err),
        }
    }

    async fn try_detect(
        &self,
        session: &Session,
        finish_line: Waypoint,
    ) -> Result<Option<Lap>, DetectionError> {
        let window = self.windows.current_window(session.id).await?;

        let points: Vec<TelemetryPoint> = self
            .telemetry
            .recent(session.id, self.config.window_points)
            .await?
            .into_iter()
            .filter(|point| point.timestamp > window.floor_ms)
            .collect();

        if points.len() < self.config.min_points {
            tracing::debug!(
                session_id = %session.id,
                points = points.len(),
                "Not enough points in lap window"
            );
            return Ok(None);
        }

        let tail_start = points.len().saturating_sub(self.config.scan_points);
        let Some(crossing) = points[tail_start..]
            .iter()
            .find(|point| geodesic::distance(*point, &finish_line) <= self.config.radius_m)
        else {
            return Ok(None);
        };

        let speeds = SpeedSummary::from_points(&points);
        let lap = Lap {
            id: LapId::new(),
            session_id: session.id,
            user_id: session.user_id,
            track_id: session.track_id,
            lap_number: window.next_lap_number(),
            lap_time: (crossing.timestamp - window.floor_ms) as f64 / 1000.0,
            top_speed: speeds.top_speed,
            avg_speed: speeds.avg_speed,
            start_timestamp: window.floor_ms,
            end_timestamp: crossing.timestamp,
            created_at: Utc::now(),
        };

        let lap = match self.laps.create(&lap).await {
            Ok(lap) => lap,
            Err(AppError::Conflict(message)) => {
                tracing::warn!(
                    session_id = %session.id,
                    lap_number = lap.lap_number,
                    %message,
                    "Lap number already claimed, skipping"
                );
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            session_id = %session.id,
            lap_id = %lap.id,
            lap_number = lap.lap_number,
            lap_time = lap.lap_time,
            "Lap completed"
        );

        dispatch_lap_completed(self.events.clone(), LapCompletedEvent::from(&lap));

        Ok(Some(lap))
    }
}
