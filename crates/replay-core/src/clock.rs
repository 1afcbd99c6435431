//! Fractional, speed-scaled playback clock over a fixed frame sequence.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReplayConfig;
use crate::error::{ReplayError, Result};

/// Point-in-time copy of the clock, safe to hand to a renderer.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct PlaybackState {
    pub frame_index: f64,
    pub speed: f64,
    pub paused: bool,
}

/// Discrete user command from the host input layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackCommand {
    TogglePause,
    SeekBy(f64),
    Rewind,
    FastForward,
    SpeedUp,
    SlowDown,
    SetSpeed(f64),
    Preset(usize),
    Restart,
}

#[derive(Clone, Debug)]
pub struct PlaybackClock {
    state: PlaybackState,
    frame_count: usize,
    frame_rate: f64,
    min_speed: f64,
    seek_step: f64,
    presets: Vec<f64>,
}

impl PlaybackClock {
    pub fn new(frame_count: usize, config: &ReplayConfig) -> Result<Self> {
        if frame_count == 0 {
            return Err(ReplayError::EmptySession);
        }
        if !(config.frame_rate.is_finite() && config.frame_rate > 0.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "frame_rate must be > 0, got {}",
                config.frame_rate
            )));
        }
        let mut clock = Self {
            state: PlaybackState { frame_index: 0.0, speed: 1.0, paused: false },
            frame_count,
            frame_rate: config.frame_rate,
            min_speed: config.min_speed.max(f64::MIN_POSITIVE),
            seek_step: config.seek_step_frames,
            presets: config.speed_presets.clone(),
        };
        clock.set_speed(config.playback_speed)?;
        Ok(clock)
    }

    fn last_index(&self) -> f64 {
        (self.frame_count - 1) as f64
    }

    fn clamp_index(&self, idx: f64) -> f64 {
        idx.clamp(0.0, self.last_index())
    }

    /// Moves time forward by one tick. Must be called exactly once per tick.
    pub fn advance(&mut self, elapsed_s: f64) {
        if self.state.paused {
            return;
        }
        if !elapsed_s.is_finite() {
            debug!(elapsed_s, "ignoring non-finite tick");
            return;
        }
        let next = self.state.frame_index + elapsed_s * self.frame_rate * self.state.speed;
        self.state.frame_index = self.clamp_index(next);
    }

    pub fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
    }

    /// Non-finite deltas are ignored and the current position is kept.
    pub fn seek_by(&mut self, delta_frames: f64) {
        if !delta_frames.is_finite() {
            debug!(delta_frames, "ignoring non-finite seek");
            return;
        }
        self.state.frame_index = self.clamp_index(self.state.frame_index + delta_frames);
    }

    /// Applies `multiplier`, raised to the speed floor if it is below it.
    ///
    /// Zero, negative and non-finite values are rejected and the previous
    /// speed is kept.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(ReplayError::InvalidSpeed(multiplier));
        }
        self.state.speed = multiplier.max(self.min_speed);
        Ok(self.state.speed)
    }

    /// Back to the first frame at normal speed; pause state is kept.
    pub fn restart(&mut self) {
        self.state.frame_index = 0.0;
        self.state.speed = 1.0;
    }

    pub fn apply(&mut self, cmd: PlaybackCommand) -> Result<()> {
        match cmd {
            PlaybackCommand::TogglePause => self.toggle_pause(),
            PlaybackCommand::SeekBy(d) => self.seek_by(d),
            PlaybackCommand::Rewind => self.seek_by(-self.seek_step),
            PlaybackCommand::FastForward => self.seek_by(self.seek_step),
            PlaybackCommand::SpeedUp => {
                self.set_speed(self.state.speed * 2.0)?;
            }
            PlaybackCommand::SlowDown => {
                self.set_speed(self.state.speed / 2.0)?;
            }
            PlaybackCommand::SetSpeed(s) => {
                self.set_speed(s)?;
            }
            PlaybackCommand::Preset(i) => match self.presets.get(i).copied() {
                Some(s) => {
                    self.set_speed(s)?;
                }
                None => debug!(index = i, "no speed preset at index"),
            },
            PlaybackCommand::Restart => self.restart(),
        }
        Ok(())
    }

    /// Index of the frame to display.
    pub fn active_frame(&self) -> usize {
        let idx = self.clamp_index(self.state.frame_index).floor();
        idx as usize
    }

    pub fn frame_index(&self) -> f64 {
        self.state.frame_index
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }
}
