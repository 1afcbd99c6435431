//! Geometry and playback core for replaying recorded race telemetry.

pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod race_state;
pub mod reference;
pub mod session;
pub mod viewport;

pub use clock::{PlaybackClock, PlaybackCommand, PlaybackState};
pub use config::ReplayConfig;
pub use error::{ReplayError, Result};
pub use geometry::{resample, TrackGeometry, TrackOutline};
pub use race_state::{
    format_race_time, lap_label, leader, rank_drivers, resolve_status, ProgressEntry, StatusTimeline,
};
pub use reference::ReferenceCurve;
pub use session::{CarMarker, DriverInfo, ReplaySession, ReplaySnapshot};
pub use viewport::{Viewport, ViewportTransform};
