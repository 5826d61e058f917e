//! Session repository.
//!
//! Sessions are created on request and mutated exactly once, when stopped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::session::{Session, SessionStatus};
use crate::repositories::common::push_clause;
use crate::types::{SessionId, TrackId, UserId};

const SELECT_COLUMNS: &str = "id, user_id, track_id, start_time, end_time, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepositoryTrait: Send + Sync {
    /// Inserts a new active session. Fails with `Conflict` when the user
    /// already holds an active session on the track.
    async fn create(&self, session: &Session) -> Result<Session, AppError>;

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError>;

    /// Finds the caller's active session on a track, if any.
    async fn find_active(
        &self,
        user_id: UserId,
        track_id: TrackId,
    ) -> Result<Option<Session>, AppError>;

    /// Sets the end time of an active session. Returns `None` when the session
    /// does not exist or was already stopped.
    async fn stop(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError>;

    /// Lists a user's sessions, newest start first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Session>, AppError>;
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepositoryTrait for SessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        let query = format!(
            "INSERT INTO sessions (id, user_id, track_id, start_time, end_time, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.track_id)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::Conflict(
                    "You already have an active session for this track".into(),
                ),
                other => other,
            })?;
        Ok(row)
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        let query = format!("SELECT {} FROM sessions WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_active(
        &self,
        user_id: UserId,
        track_id: TrackId,
    ) -> Result<Option<Session>, AppError> {
        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 AND track_id = $2 AND end_time IS NULL",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn stop(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        // The `end_time IS NULL` guard makes stopping a single conditional write.
        let query = format!(
            "UPDATE sessions SET end_time = $2 WHERE id = $1 AND end_time IS NULL RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(end_time)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Session>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM sessions", SELECT_COLUMNS));
        let mut has_clause = false;

        push_clause(&mut builder, &mut has_clause);
        builder.push("user_id = ").push_bind(user_id);

        match status {
            Some(SessionStatus::Active) => {
                push_clause(&mut builder, &mut has_clause);
                builder.push("end_time IS NULL");
            }
            Some(SessionStatus::Completed) => {
                push_clause(&mut builder, &mut has_clause);
                builder.push("end_time IS NOT NULL");
            }
            None => {}
        }

        builder
            .push(" ORDER BY start_time DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<Session>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
