//! Lap repository.
//!
//! Laps are insert-only. `(session_id, lap_number)` is unique, so inserting
//! lap N for a session is a claim that at most one writer can win.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::lap::Lap;
use crate::repositories::common::push_clause;
use crate::types::{SessionId, TrackId, UserId};

const SELECT_COLUMNS: &str = "id, session_id, user_id, track_id, lap_number, lap_time, \
     top_speed, avg_speed, start_timestamp, end_timestamp, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LapRepositoryTrait: Send + Sync {
    /// The lap with the highest lap number for the session.
    async fn latest_for_session(&self, session_id: SessionId) -> Result<Option<Lap>, AppError>;

    /// Inserts a lap. Fails with `Conflict` if the lap number is already taken.
    async fn create(&self, lap: &Lap) -> Result<Lap, AppError>;

    /// All laps of a session, ascending by lap number.
    async fn list_for_session(&self, session_id: SessionId) -> Result<Vec<Lap>, AppError>;

    /// Each user's fastest lap on a track, in leaderboard order, paged.
    async fn best_for_track(
        &self,
        track_id: TrackId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError>;

    /// Number of distinct users with at least one lap on the track.
    async fn count_ranked_users(&self, track_id: TrackId) -> Result<i64, AppError>;

    /// Most recent laps across all tracks, newest first.
    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Lap>, AppError>;

    /// A user's laps, optionally restricted to one track, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        track_id: Option<TrackId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError>;
}

#[derive(Debug, Clone)]
pub struct LapRepository {
    pool: PgPool,
}

impl LapRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LapRepositoryTrait for LapRepository {
    async fn latest_for_session(&self, session_id: SessionId) -> Result<Option<Lap>, AppError> {
        let query = format!(
            "SELECT {} FROM laps WHERE session_id = $1 ORDER BY lap_number DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Lap>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, lap: &Lap) -> Result<Lap, AppError> {
        let query = format!(
            "INSERT INTO laps (id, session_id, user_id, track_id, lap_number, lap_time, \
                 top_speed, avg_speed, start_timestamp, end_timestamp, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Lap>(&query)
            .bind(lap.id)
            .bind(lap.session_id)
            .bind(lap.user_id)
            .bind(lap.track_id)
            .bind(lap.lap_number)
            .bind(lap.lap_time)
            .bind(lap.top_speed)
            .bind(lap.avg_speed)
            .bind(lap.start_timestamp)
            .bind(lap.end_timestamp)
            .bind(lap.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_session(&self, session_id: SessionId) -> Result<Vec<Lap>, AppError> {
        let query = format!(
            "SELECT {} FROM laps WHERE session_id = $1 ORDER BY lap_number ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Lap>(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn best_for_track(
        &self,
        track_id: TrackId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError> {
        let query = format!(
            "SELECT {} FROM ( \
                 SELECT DISTINCT ON (user_id) {} FROM laps \
                 WHERE track_id = $1 \
                 ORDER BY user_id, lap_time ASC, end_timestamp ASC, id ASC \
             ) best \
             ORDER BY lap_time ASC, end_timestamp ASC, id ASC \
             LIMIT $2 OFFSET $3",
            SELECT_COLUMNS, SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Lap>(&query)
            .bind(track_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_ranked_users(&self, track_id: TrackId) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM laps WHERE track_id = $1")
                .bind(track_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Lap>, AppError> {
        let query = format!(
            "SELECT {} FROM laps ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Lap>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        track_id: Option<TrackId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lap>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM laps", SELECT_COLUMNS));
        let mut has_clause = false;

        push_clause(&mut builder, &mut has_clause);
        builder.push("user_id = ").push_bind(user_id);

        if let Some(track_id) = track_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("track_id = ").push_bind(track_id);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder.build_query_as::<Lap>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
