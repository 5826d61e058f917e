//! Telemetry store adapter.
//!
//! Points are append-only and always read back ordered by fix timestamp, never
//! by insertion order.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::telemetry::{NewTelemetryPoint, TelemetryPoint};
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::types::SessionId;

const SELECT_COLUMNS: &str = "id, session_id, lat, lng, speed, altitude, accuracy, timestamp";

/// Postgres caps bind parameters per statement; seven binds per point.
const MAX_POINTS_PER_INSERT: usize = 5000;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryRepositoryTrait: Send + Sync {
    /// Appends already validated points, returning them with their store ids.
    /// The batch is stored whole or not at all.
    async fn append(
        &self,
        session_id: SessionId,
        points: &[NewTelemetryPoint],
    ) -> Result<Vec<TelemetryPoint>, AppError>;

    /// Returns the `limit` most recent points, ordered ascending by timestamp.
    async fn recent(&self, session_id: SessionId, limit: i64)
        -> Result<Vec<TelemetryPoint>, AppError>;

    /// Pages through a session's points ascending by timestamp.
    async fn list(
        &self,
        session_id: SessionId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TelemetryPoint>, AppError>;

    async fn count(&self, session_id: SessionId) -> Result<i64, AppError>;
}

#[derive(Debug, Clone)]
pub struct TelemetryRepository {
    pool: PgPool,
}

impl TelemetryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryRepositoryTrait for TelemetryRepository {
    async fn append(
        &self,
        session_id: SessionId,
        points: &[NewTelemetryPoint],
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let mut inserted = Vec::with_capacity(points.len());
        let mut tx = begin_transaction(&self.pool).await?;

        for chunk in points.chunks(MAX_POINTS_PER_INSERT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO telemetry_points (session_id, lat, lng, speed, altitude, accuracy, timestamp) ",
            );
            builder.push_values(chunk, |mut row, point| {
                row.push_bind(session_id)
                    .push_bind(point.lat)
                    .push_bind(point.lng)
                    .push_bind(point.speed)
                    .push_bind(point.altitude)
                    .push_bind(point.accuracy)
                    .push_bind(point.timestamp);
            });
            builder.push(" RETURNING ").push(SELECT_COLUMNS);

            let rows = builder
                .build_query_as::<TelemetryPoint>()
                .fetch_all(&mut *tx)
                .await?;
            inserted.extend(rows);
        }

        commit_transaction(tx).await?;
        Ok(inserted)
    }

    async fn recent(
        &self,
        session_id: SessionId,
        limit: i64,
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let query = format!(
            "SELECT {} FROM ( \
                 SELECT {} FROM telemetry_points \
                 WHERE session_id = $1 \
                 ORDER BY timestamp DESC, id DESC \
                 LIMIT $2 \
             ) recent ORDER BY timestamp ASC, id ASC",
            SELECT_COLUMNS, SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TelemetryPoint>(&query)
            .bind(session_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list(
        &self,
        session_id: SessionId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TelemetryPoint>, AppError> {
        let query = format!(
            "SELECT {} FROM telemetry_points WHERE session_id = $1 \
             ORDER BY timestamp ASC, id ASC LIMIT $2 OFFSET $3",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TelemetryPoint>(&query)
            .bind(session_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, session_id: SessionId) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM telemetry_points WHERE session_id = $1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
