use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        InMemoryStore, LapRepository, LapRepositoryTrait, SessionRepository,
        SessionRepositoryTrait, TelemetryRepository, TelemetryRepositoryTrait, TrackRepository,
        TrackRepositoryTrait,
    },
    services::{
        ActivityFeedSink, LapDetector, LapEventSink, LeaderboardService, SessionLocks,
        SessionService, SessionWindowTracker, TelemetryService,
    },
};

/// Shared handler state. Stores sit behind trait objects so the same router
/// runs against Postgres in production and an in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub telemetry: TelemetryService,
    pub sessions: SessionService,
    pub leaderboard: LeaderboardService,
}

pub struct Stores {
    pub sessions: Arc<dyn SessionRepositoryTrait>,
    pub tracks: Arc<dyn TrackRepositoryTrait>,
    pub telemetry: Arc<dyn TelemetryRepositoryTrait>,
    pub laps: Arc<dyn LapRepositoryTrait>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, events: Arc<dyn LapEventSink>) -> Self {
        let locks = Arc::new(SessionLocks::new());
        let windows = SessionWindowTracker::new(stores.sessions.clone(), stores.laps.clone());
        let detector = LapDetector::new(
            stores.telemetry.clone(),
            stores.laps.clone(),
            windows,
            events,
            config.lap_detection,
        );

        Self {
            telemetry: TelemetryService::new(
                stores.sessions.clone(),
                stores.tracks.clone(),
                stores.telemetry.clone(),
                detector,
                locks.clone(),
            ),
            sessions: SessionService::new(stores.sessions.clone(), stores.tracks.clone(), locks),
            leaderboard: LeaderboardService::new(stores.tracks, stores.sessions, stores.laps),
            config,
        }
    }

    pub fn from_pool(pool: DbPool, config: Config) -> Self {
        let stores = Stores {
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            tracks: Arc::new(TrackRepository::new(pool.clone())),
            telemetry: Arc::new(TelemetryRepository::new(pool.clone())),
            laps: Arc::new(LapRepository::new(pool.clone())),
        };
        Self::new(config, stores, Arc::new(ActivityFeedSink::new(pool)))
    }

    pub fn in_memory(store: InMemoryStore, config: Config, events: Arc<dyn LapEventSink>) -> Self {
        let stores = Stores {
            sessions: Arc::new(store.clone()),
            tracks: Arc::new(store.clone()),
            telemetry: Arc::new(store.clone()),
            laps: Arc::new(store),
        };
        Self::new(config, stores, events)
    }
}
