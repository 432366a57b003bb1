//! Scene host capability interface
//!
//! The gameplay controller never touches a renderer or physics world
//! directly. Everything it needs from the engine (node creation, physics
//! bodies, position actions, labels, the repeating spawn timer) goes through
//! [`SceneHost`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Category;

/// Opaque handle for a node in the host's scene tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Opaque handle for a repeating host timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u32);

/// Scene layer a node is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Scene root: bird, ground, labels
    Root,
    /// Scrolling world: background tiles and pipes. Its speed freezes on game over.
    Moving,
}

/// Collision shape of a physics body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Circle { radius: f32 },
    Rect { size: Vec2 },
}

/// Physics body attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub shape: BodyShape,
    /// Affected by gravity and impulses
    pub dynamic: bool,
    pub allows_rotation: bool,
    pub category: Category,
    /// Categories this body physically collides with
    pub collision: Category,
    /// Categories that produce contact callbacks
    pub contact: Category,
}

impl Body {
    /// Static body that only announces its category
    pub fn fixed(shape: BodyShape, category: Category) -> Self {
        Self {
            shape,
            dynamic: false,
            allows_rotation: false,
            category,
            collision: Category::NONE,
            contact: Category::NONE,
        }
    }
}

/// What a node draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Textured sprite
    Sprite { texture: String },
    /// Invisible node (ground, gap sensor)
    Empty,
    /// Text label
    Label {
        text: String,
        font: String,
        font_size: f32,
    },
}

/// Everything the host needs to instantiate a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub position: Vec2,
    pub size: Vec2,
    pub z: f32,
    pub body: Option<Body>,
}

impl NodeSpec {
    pub fn sprite(texture: &str, position: Vec2, size: Vec2, z: f32) -> Self {
        Self {
            kind: NodeKind::Sprite {
                texture: texture.to_string(),
            },
            position,
            size,
            z,
            body: None,
        }
    }

    pub fn empty(position: Vec2, size: Vec2, z: f32) -> Self {
        Self {
            kind: NodeKind::Empty,
            position,
            size,
            z,
            body: None,
        }
    }

    pub fn label(text: &str, font: &str, font_size: f32, position: Vec2, z: f32) -> Self {
        Self {
            kind: NodeKind::Label {
                text: text.to_string(),
                font: font.to_string(),
                font_size,
            },
            position,
            size: Vec2::ZERO,
            z,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }
}

/// Time-based node action, run by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Translate by `delta` linearly over `secs` (0 = instant)
    MoveBy { delta: Vec2, secs: f32 },
    /// Detach the node from the scene
    Remove,
    /// Cycle through textures, one pass
    Animate {
        textures: Vec<String>,
        frame_secs: f32,
    },
    Sequence(Vec<Action>),
    RepeatForever(Box<Action>),
}

impl Action {
    /// Duration of one pass (infinite for `RepeatForever`)
    pub fn duration(&self) -> f32 {
        match self {
            Action::MoveBy { secs, .. } => secs.max(0.0),
            Action::Remove => 0.0,
            Action::Animate {
                textures,
                frame_secs,
            } => frame_secs * textures.len() as f32,
            Action::Sequence(steps) => steps.iter().map(Action::duration).sum(),
            Action::RepeatForever(_) => f32::INFINITY,
        }
    }

    /// Total translation produced after `t` seconds of running
    pub fn displacement_at(&self, t: f32) -> Vec2 {
        if t < 0.0 {
            return Vec2::ZERO;
        }
        match self {
            Action::MoveBy { delta, secs } => {
                if *secs <= 0.0 {
                    *delta
                } else {
                    *delta * (t / secs).min(1.0)
                }
            }
            Action::Remove | Action::Animate { .. } => Vec2::ZERO,
            Action::Sequence(steps) => {
                let mut start = 0.0;
                let mut total = Vec2::ZERO;
                for step in steps {
                    if t < start {
                        break;
                    }
                    total += step.displacement_at(t - start);
                    start += step.duration();
                }
                total
            }
            Action::RepeatForever(inner) => {
                let period = inner.duration();
                if period <= 0.0 || !period.is_finite() {
                    return inner.displacement_at(t);
                }
                let cycles = (t / period).floor();
                let per_cycle = inner.displacement_at(period);
                per_cycle * cycles + inner.displacement_at(t - cycles * period)
            }
        }
    }

    /// Seconds after which the action removes its node, if it ever does
    pub fn removal_time(&self) -> Option<f32> {
        match self {
            Action::Remove => Some(0.0),
            Action::MoveBy { .. } | Action::Animate { .. } => None,
            Action::Sequence(steps) => {
                let mut start = 0.0;
                for step in steps {
                    if let Some(t) = step.removal_time() {
                        return Some(start + t);
                    }
                    start += step.duration();
                }
                None
            }
            Action::RepeatForever(inner) => inner.removal_time(),
        }
    }

    /// Texture shown after `t` seconds, for texture animations
    pub fn texture_at(&self, t: f32) -> Option<&str> {
        match self {
            Action::Animate {
                textures,
                frame_secs,
            } => {
                if textures.is_empty() {
                    return None;
                }
                let frame = if *frame_secs > 0.0 {
                    ((t.max(0.0) / frame_secs) as usize).min(textures.len() - 1)
                } else {
                    textures.len() - 1
                };
                Some(textures[frame].as_str())
            }
            Action::Sequence(steps) => {
                let mut start = 0.0;
                let mut shown = None;
                for step in steps {
                    if t < start {
                        break;
                    }
                    if let Some(tex) = step.texture_at(t - start) {
                        shown = Some(tex);
                    }
                    start += step.duration();
                }
                shown
            }
            Action::RepeatForever(inner) => {
                let period = inner.duration();
                if period <= 0.0 || !period.is_finite() {
                    inner.texture_at(t)
                } else {
                    inner.texture_at(t.max(0.0) % period)
                }
            }
            _ => None,
        }
    }
}

/// Engine services the gameplay controller consumes
///
/// Hosts deliver events serially from one run loop; implementations never see
/// concurrent calls.
pub trait SceneHost {
    /// Configure world gravity for the host physics simulation
    fn set_gravity(&mut self, gravity: Vec2);

    /// Instantiate a node (with optional physics body) on a layer
    fn spawn(&mut self, layer: Layer, spec: NodeSpec) -> NodeId;

    /// Start running an action on a node
    fn run_action(&mut self, node: NodeId, action: Action);

    /// Remove a node; unknown ids are ignored
    fn remove(&mut self, node: NodeId);

    /// Remove every node attached to a layer
    fn clear_layer(&mut self, layer: Layer);

    fn set_position(&mut self, node: NodeId, position: Vec2);

    fn set_velocity(&mut self, node: NodeId, velocity: Vec2);

    fn apply_impulse(&mut self, node: NodeId, impulse: Vec2);

    /// Replace a label's text
    fn set_text(&mut self, node: NodeId, text: &str);

    /// Playback speed of a layer's actions (0 freezes it)
    fn set_layer_speed(&mut self, layer: Layer, speed: f32);

    /// Start a repeating timer; each firing is delivered as a spawn tick
    fn start_timer(&mut self, interval_secs: f32) -> TimerId;

    /// Invalidate a timer; it never fires again
    fn cancel_timer(&mut self, timer: TimerId);
}
