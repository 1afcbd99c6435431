use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    /// Offset of each boundary from the centerline, metres.
    pub track_half_width_m: f64,
    /// Sample count of the reference curve used for projection.
    pub reference_points: usize,
    /// Sample count of each drawn boundary.
    pub outline_points: usize,
    /// Fraction of the viewport kept clear on every side.
    pub padding: f64,
    pub left_margin: f64,
    pub right_margin: f64,
    pub rotation_deg: f64,
    /// Telemetry frames per second of session time.
    pub frame_rate: f64,
    pub playback_speed: f64,
    pub min_speed: f64,
    pub seek_step_frames: f64,
    pub speed_presets: Vec<f64>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            track_half_width_m: 100.0,
            reference_points: 4000,
            outline_points: 2000,
            padding: 0.05,
            left_margin: 340.0,
            right_margin: 260.0,
            rotation_deg: 0.0,
            frame_rate: 25.0,
            playback_speed: 1.0,
            min_speed: 0.1,
            seek_step_frames: 10.0,
            speed_presets: vec![0.5, 1.0, 2.0, 4.0],
        }
    }
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if ok { Ok(()) } else { Err(ReplayError::InvalidConfig(msg())) }
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<()> {
        check(self.track_half_width_m.is_finite() && self.track_half_width_m >= 0.0, || {
            format!("track_half_width_m must be >= 0, got {}", self.track_half_width_m)
        })?;
        check(self.reference_points >= 2, || {
            format!("reference_points must be >= 2, got {}", self.reference_points)
        })?;
        check(self.outline_points >= 2, || {
            format!("outline_points must be >= 2, got {}", self.outline_points)
        })?;
        check((0.0..0.5).contains(&self.padding), || {
            format!("padding must be in [0, 0.5), got {}", self.padding)
        })?;
        check(self.left_margin >= 0.0 && self.right_margin >= 0.0, || {
            format!("margins must be >= 0, got {} / {}", self.left_margin, self.right_margin)
        })?;
        check(self.rotation_deg.is_finite(), || "rotation_deg must be finite".to_string())?;
        check(self.frame_rate.is_finite() && self.frame_rate > 0.0, || {
            format!("frame_rate must be > 0, got {}", self.frame_rate)
        })?;
        check(self.min_speed.is_finite() && self.min_speed > 0.0, || {
            format!("min_speed must be > 0, got {}", self.min_speed)
        })?;
        check(self.playback_speed.is_finite() && self.playback_speed > 0.0, || {
            format!("playback_speed must be > 0, got {}", self.playback_speed)
        })?;
        check(self.seek_step_frames.is_finite() && self.seek_step_frames >= 0.0, || {
            format!("seek_step_frames must be >= 0, got {}", self.seek_step_frames)
        })?;
        check(self.speed_presets.iter().all(|s| s.is_finite() && *s > 0.0), || {
            format!("speed_presets must all be > 0, got {:?}", self.speed_presets)
        })?;
        Ok(())
    }

    pub fn rotation_rad(&self) -> f64 {
        self.rotation_deg.to_radians()
    }
}
