pub mod geodesic;
pub mod lap_detector;
pub mod lap_events;
pub mod leaderboard;
pub mod session_locks;
pub mod session_window;
pub mod sessions;
pub mod speed;
pub mod telemetry;

pub use lap_detector::{DetectionOutcome, LapDetector};
pub use lap_events::{ActivityFeedSink, ChannelLapEventSink, LapEventSink};
pub use leaderboard::LeaderboardService;
pub use session_locks::SessionLocks;
pub use session_window::SessionWindowTracker;
pub use sessions::SessionService;
pub use telemetry::TelemetryService;
