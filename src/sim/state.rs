//! Game state and core gameplay types

use std::ops::BitOr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::host::{NodeId, TimerId};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Bird is flying, pipes spawn
    Playing,
    /// Bird hit the ground or a pipe; waiting for a tap to restart
    GameOver,
}

/// Physics category bitmask used for contact filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Category(pub u32);

impl Category {
    pub const NONE: Category = Category(0);
    pub const BIRD: Category = Category(1);
    /// Ground and pipes
    pub const OBJECT: Category = Category(1 << 1);
    /// Invisible sensor between paired pipes
    pub const GAP: Category = Category(1 << 2);

    pub fn contains(self, other: Category) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for Category {
    type Output = Category;

    fn bitor(self, rhs: Category) -> Category {
        Category(self.0 | rhs.0)
    }
}

/// Host-delivered input to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player tapped anywhere
    Tap,
    /// Repeating spawn timer fired
    SpawnTick,
    /// Two physics bodies began touching
    Contact { a: Category, b: Category },
}

/// The player's bird
///
/// Velocity is tracked in impulse units (unit mass); the host applies the
/// real body mass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    pub node: Option<NodeId>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
}

impl Bird {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            node: None,
            pos,
            vel: Vec2::ZERO,
            size,
        }
    }
}

/// One spawned obstacle: upper pipe, lower pipe and the gap sensor between
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipePair {
    pub upper: NodeId,
    pub lower: NodeId,
    pub gap: NodeId,
    /// Vertical offset of the gap center from frame center
    pub offset: f32,
    pub gap_height: f32,
    /// Spawn position of the upper pipe, lower pipe and gap sensor
    pub upper_pos: Vec2,
    pub lower_pos: Vec2,
    pub gap_pos: Vec2,
    /// Leftward speed in points per second
    pub speed: f32,
}

/// Complete controller state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u32,
    pub bird: Bird,
    /// Pipe pairs spawned in the current run
    pub pipes_spawned: u32,
    /// Most recently spawned pair
    pub last_pair: Option<PipePair>,
    /// Active spawn timer (None once cancelled)
    pub spawn_timer: Option<TimerId>,
    pub score_label: Option<NodeId>,
    pub game_over_label: Option<NodeId>,
    /// Playback speed of the scrolling world
    pub world_speed: f32,
    /// Completed runs (game overs) since start
    pub runs: u32,
}

impl GameState {
    /// Fresh state with the bird at frame center
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Playing,
            score: 0,
            bird: Bird::new(tuning.frame_center(), tuning.bird_size()),
            pipes_spawned: 0,
            last_pair: None,
            spawn_timer: None,
            score_label: None,
            game_over_label: None,
            world_speed: 1.0,
            runs: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}
