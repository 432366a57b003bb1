//! Flappy Tap - tap-to-flap arcade gameplay core
//!
//! Core modules:
//! - `sim`: Gameplay state machine (phases, scoring, pipe spawning, scene commands)
//! - `tuning`: Data-driven game balance, loadable from JSON
//!
//! Rendering, physics and input delivery belong to the host engine, reached
//! through the [`sim::SceneHost`] trait.

pub mod sim;
pub mod tuning;

pub use sim::{GameEvent, GamePhase, GameplayController, HeadlessScene, SceneHost};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Default visible frame size (points)
    pub const FRAME_WIDTH: f32 = 768.0;
    pub const FRAME_HEIGHT: f32 = 1024.0;

    /// World gravity handed to the host physics (points/s²)
    pub const GRAVITY_Y: f32 = -5.0;
    /// Upward impulse applied on every tap while playing
    pub const TAP_IMPULSE: f32 = 60.0;

    /// Seconds between pipe spawns
    pub const SPAWN_INTERVAL_SECS: f32 = 3.0;
    /// Gap height as a multiple of the bird sprite height
    pub const GAP_BIRD_MULTIPLIER: f32 = 4.0;
    /// Frame width divided by this gives the pipe crossing time in seconds
    pub const PIPE_CROSSING_DIVISOR: f32 = 100.0;

    /// Sprite sizes of the stock textures
    pub const BIRD_WIDTH: f32 = 87.0;
    pub const BIRD_HEIGHT: f32 = 61.0;
    pub const PIPE_WIDTH: f32 = 104.0;
    pub const PIPE_HEIGHT: f32 = 800.0;

    /// Background tiles: count, texture width, seconds to scroll one tile width
    pub const BACKGROUND_TILES: u32 = 3;
    pub const BACKGROUND_WIDTH: f32 = 1536.0;
    pub const BACKGROUND_SCROLL_SECS: f32 = 9.0;

    /// Seconds per bird flap animation frame
    pub const FLAP_FRAME_SECS: f32 = 0.1;

    /// Score label inset from the top of the frame
    pub const SCORE_LABEL_INSET: f32 = 70.0;
    pub const SCORE_FONT_SIZE: f32 = 60.0;
    pub const GAME_OVER_FONT_SIZE: f32 = 30.0;
    pub const LABEL_FONT: &str = "Helvetica";
    pub const GAME_OVER_TEXT: &str = "Tap to try again";

    /// Draw order
    pub const Z_BACKGROUND: f32 = 1.0;
    pub const Z_PIPE_UP: f32 = 5.0;
    pub const Z_PIPE_DOWN: f32 = 6.0;
    pub const Z_BIRD: f32 = 10.0;
    pub const Z_GAP: f32 = 30.0;
    pub const Z_SCORE: f32 = 40.0;
    pub const Z_GAME_OVER: f32 = 50.0;
}
