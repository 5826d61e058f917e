//! "Lap completed" notifications for achievement and statistics consumers.
//!
//! Delivery is fire-and-forget: the detector hands the event to
//! [`dispatch_lap_completed`], which runs the sink on a detached task and only
//! logs failures.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::lap::Lap;
use crate::types::{LapId, SessionId, TrackId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LapCompletedEvent {
    pub lap_id: LapId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub lap_number: i32,
    pub lap_time: f64,
}

impl From<&Lap> for LapCompletedEvent {
    fn from(lap: &Lap) -> Self {
        Self {
            lap_id: lap.id,
            session_id: lap.session_id,
            user_id: lap.user_id,
            track_id: lap.track_id,
            lap_number: lap.lap_number,
            lap_time: lap.lap_time,
        }
    }
}

#[async_trait]
pub trait LapEventSink: Send + Sync {
    async fn lap_completed(&self, event: LapCompletedEvent) -> anyhow::Result<()>;
}

/// Spawns delivery of the event and returns immediately.
pub fn dispatch_lap_completed(sink: Arc<dyn LapEventSink>, event: LapCompletedEvent) {
    tokio::spawn(async move {
        let lap_id = event.lap_id;
        if let Err(err) = sink.lap_completed(event).await {
            tracing::warn!(
                error = ?err,
                lap_id = %lap_id,
                "Failed to deliver lap completed event"
            );
        }
    });
}

/// Records lap completions in the `activities` feed table.
#[derive(Debug, Clone)]
pub struct ActivityFeedSink {
    pool: PgPool,
}

impl ActivityFeedSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LapEventSink for ActivityFeedSink {
    async fn lap_completed(&self, event: LapCompletedEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, activity_type, entity_type, entity_id, metadata)
            VALUES ($1, $2, 'lap_completed', 'lap', $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(event.lap_id)
        .bind(json!({
            "track_id": event.track_id,
            "lap_number": event.lap_number,
            "lap_time": event.lap_time,
        }))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Forwards events to an in-process consumer.
#[derive(Debug, Clone)]
pub struct ChannelLapEventSink {
    sender: mpsc::UnboundedSender<LapCompletedEvent>,
}

impl ChannelLapEventSink {
    /// Creates a sink together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LapCompletedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl LapEventSink for ChannelLapEventSink {
    async fn lap_completed(&self, event: LapCompletedEvent) -> anyhow::Result<()> {
        self.sender
            .send(event)
            .map_err(|_| anyhow::anyhow!("lap event receiver dropped"))
    }
}
