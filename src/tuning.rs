//! Game balance and frame settings
//!
//! Defaults come from [`crate::consts`]; a JSON file may override any subset.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Shortest spawn interval a tuning file may ask for
pub const MIN_SPAWN_INTERVAL_SECS: f32 = 0.1;

/// Failure to load a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value: {0}")]
    Invalid(String),
}

/// Data-driven game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Frame ===
    pub frame_width: f32,
    pub frame_height: f32,

    // === Physics (handed to the host) ===
    pub gravity_y: f32,
    pub tap_impulse: f32,

    // === Pipes ===
    pub spawn_interval_secs: f32,
    pub gap_bird_multiplier: f32,
    pub pipe_crossing_divisor: f32,
    pub pipe_width: f32,
    pub pipe_height: f32,

    // === Bird ===
    pub bird_width: f32,
    pub bird_height: f32,
    pub flap_frame_secs: f32,

    // === Background ===
    pub background_tiles: u32,
    pub background_width: f32,
    pub background_scroll_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,

            gravity_y: GRAVITY_Y,
            tap_impulse: TAP_IMPULSE,

            spawn_interval_secs: SPAWN_INTERVAL_SECS,
            gap_bird_multiplier: GAP_BIRD_MULTIPLIER,
            pipe_crossing_divisor: PIPE_CROSSING_DIVISOR,
            pipe_width: PIPE_WIDTH,
            pipe_height: PIPE_HEIGHT,

            bird_width: BIRD_WIDTH,
            bird_height: BIRD_HEIGHT,
            flap_frame_secs: FLAP_FRAME_SECS,

            background_tiles: BACKGROUND_TILES,
            background_width: BACKGROUND_WIDTH,
            background_scroll_secs: BACKGROUND_SCROLL_SECS,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the controller and scene cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.spawn_interval_secs.is_nan() || self.spawn_interval_secs < MIN_SPAWN_INTERVAL_SECS {
            return Err(TuningError::Invalid(format!(
                "spawn_interval_secs must be at least {}, got {}",
                MIN_SPAWN_INTERVAL_SECS, self.spawn_interval_secs
            )));
        }
        if !positive(self.frame_width) || !positive(self.frame_height) {
            return Err(TuningError::Invalid(format!(
                "frame must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if !positive(self.pipe_crossing_divisor) {
            return Err(TuningError::Invalid(format!(
                "pipe_crossing_divisor must be positive, got {}",
                self.pipe_crossing_divisor
            )));
        }
        Ok(())
    }

    /// Read and parse a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn frame_size(&self) -> Vec2 {
        Vec2::new(self.frame_width, self.frame_height)
    }

    pub fn frame_center(&self) -> Vec2 {
        self.frame_size() * 0.5
    }

    pub fn bird_size(&self) -> Vec2 {
        Vec2::new(self.bird_width, self.bird_height)
    }

    pub fn pipe_size(&self) -> Vec2 {
        Vec2::new(self.pipe_width, self.pipe_height)
    }

    /// Vertical opening between paired pipes
    pub fn gap_height(&self) -> f32 {
        self.bird_height * self.gap_bird_multiplier
    }

    /// Seconds for a pipe to cross the frame (scales with frame width)
    pub fn pipe_crossing_secs(&self) -> f32 {
        self.frame_width / self.pipe_crossing_divisor
    }

    /// Horizontal distance a pipe travels before it is removed
    pub fn pipe_travel(&self) -> f32 {
        self.frame_width + self.pipe_width * 2.0
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
