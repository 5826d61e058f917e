//! Leaderboards and lap history, computed on demand from stored laps.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::lap::{Lap, LapResponse};
use crate::models::leaderboard::{
    GlobalLapEntry, GlobalLeaderboardResponse, LeaderboardEntry, SessionLapsResponse,
    TrackLeaderboardResponse, TrackSummary, UserLapsResponse,
};
use crate::models::MAX_PAGE_LIMIT;
use crate::repositories::{LapRepositoryTrait, SessionRepositoryTrait, TrackRepositoryTrait};
use crate::types::{SessionId, TrackId, UserId};

/// Minimum lap time; the earlier lap in `laps` wins a tie.
pub fn best_lap(laps: &[Lap]) -> Option<&Lap> {
    laps.iter().fold(None, |best: Option<&Lap>, lap| match best {
        Some(current) if current.lap_time <= lap.lap_time => Some(current),
        _ => Some(lap),
    })
}

fn page_bounds(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_LIMIT), offset.max(0))
}

#[derive(Clone)]
pub struct LeaderboardService {
    tracks: Arc<dyn TrackRepositoryTrait>,
    sessions: Arc<dyn SessionRepositoryTrait>,
    laps: Arc<dyn LapRepositoryTrait>,
}

impl LeaderboardService {
    pub fn new(
        tracks: Arc<dyn TrackRepositoryTrait>,
        sessions: Arc<dyn SessionRepositoryTrait>,
        laps: Arc<dyn LapRepositoryTrait>,
    ) -> Self {
        Self {
            tracks,
            sessions,
            laps,
        }
    }

    pub async fn track_leaderboard(
        &self,
        track_id: TrackId,
        limit: i64,
        offset: i64,
    ) -> Result<TrackLeaderboardResponse, AppError> {
        let track = self
            .tracks
            .find_by_id(track_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Track not found".into()))?;

        let (limit, offset) = page_bounds(limit, offset);
        let total = self.laps.count_ranked_users(track_id).await?;
        let leaderboard = self
            .laps
            .best_for_track(track_id, limit, offset)
            .await?
            .iter()
            .enumerate()
            .map(|(index, lap)| LeaderboardEntry::ranked(offset as usize + index + 1, lap))
            .collect();

        Ok(TrackLeaderboardResponse {
            track: TrackSummary {
                id: track.id,
                name: track.name,
                distance: track.distance,
                activity_type: track.activity_type,
            },
            leaderboard,
            total: total.max(0) as usize,
        })
    }

    pub async fn global(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<GlobalLeaderboardResponse, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let laps: Vec<GlobalLapEntry> = self
            .laps
            .list_recent(limit, offset)
            .await?
            .into_iter()
            .map(GlobalLapEntry::from)
            .collect();

        Ok(GlobalLeaderboardResponse {
            total: laps.len(),
            laps,
        })
    }

    pub async fn session_laps(&self, session_id: SessionId) -> Result<SessionLapsResponse, AppError> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        let laps = self.laps.list_for_session(session_id).await?;
        let best = best_lap(&laps).cloned().map(LapResponse::from);

        Ok(SessionLapsResponse {
            session_id,
            total: laps.len(),
            laps: laps.into_iter().map(LapResponse::from).collect(),
            best_lap: best,
        })
    }

    pub async fn user_laps(
        &self,
        user_id: UserId,
        track_id: Option<TrackId>,
        limit: i64,
        offset: i64,
    ) -> Result<UserLapsResponse, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let laps: Vec<LapResponse> = self
            .laps
            .list_for_user(user_id, track_id, limit, offset)
            .await?
            .into_iter()
            .map(LapResponse::from)
            .collect();

        Ok(UserLapsResponse {
            user_id,
            total: laps.len(),
            laps,
            limit,
            offset,
        })
    }
}
