//! Gameplay simulation module
//!
//! All gameplay logic lives here:
//! - Event-driven: tap, spawn tick and contact events arrive through `handle`
//! - Seeded RNG only
//! - Engine work (physics, rendering, timers) goes through `SceneHost`

pub mod controller;
pub mod host;
pub mod scene;
pub mod state;

pub use controller::GameplayController;
pub use host::{Action, Body, BodyShape, Layer, NodeId, NodeKind, NodeSpec, SceneHost, TimerId};
pub use scene::{HeadlessScene, SceneCommand, SceneNode};
pub use state::{Bird, Category, GameEvent, GamePhase, GameState, PipePair};
