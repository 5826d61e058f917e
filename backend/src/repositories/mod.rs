pub mod common;
pub mod lap;
pub mod memory;
pub mod session;
pub mod telemetry;
pub mod track;
pub mod transaction;

pub use common::*;
pub use lap::{LapRepository, LapRepositoryTrait};
pub use memory::InMemoryStore;
pub use session::{SessionRepository, SessionRepositoryTrait};
pub use telemetry::{TelemetryRepository, TelemetryRepositoryTrait};
pub use track::{TrackRepository, TrackRepositoryTrait};

// Mock*RepositoryTrait types are only available in test builds via #[cfg(test)]
#[cfg(test)]
pub use lap::MockLapRepositoryTrait;
#[cfg(test)]
pub use session::MockSessionRepositoryTrait;
#[cfg(test)]
pub use telemetry::MockTelemetryRepositoryTrait;
#[cfg(test)]
pub use track::MockTrackRepositoryTrait;
