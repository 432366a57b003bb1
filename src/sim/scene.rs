//! Headless scene host
//!
//! Keeps a node table, plays move/remove actions against a clock and drives
//! repeating timers, recording every command it receives. There is no
//! physics step here: contacts come from the caller as events.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use super::host::{Action, Layer, NodeId, NodeKind, NodeSpec, SceneHost, TimerId};
use super::state::GameEvent;

/// Upper bound on firings a single timer delivers per `advance`
pub const MAX_FIRES_PER_ADVANCE: usize = 64;

/// A command received from the controller, in arrival order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SceneCommand {
    SetGravity { gravity: Vec2 },
    Spawn { node: NodeId, layer: Layer },
    RunAction { node: NodeId },
    Remove { node: NodeId },
    ClearLayer { layer: Layer },
    SetPosition { node: NodeId, position: Vec2 },
    SetVelocity { node: NodeId, velocity: Vec2 },
    ApplyImpulse { node: NodeId, impulse: Vec2 },
    SetText { node: NodeId, text: String },
    SetLayerSpeed { layer: Layer, speed: f32 },
    StartTimer { timer: TimerId, interval_secs: f32 },
    CancelTimer { timer: TimerId },
}

/// A live node in the headless scene
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub layer: Layer,
    pub spec: NodeSpec,
    /// Position before the running action's displacement
    pub origin: Vec2,
    pub velocity: Vec2,
    pub action: Option<Action>,
    /// Seconds the action has been running (scaled by layer speed)
    pub action_time: f32,
}

impl SceneNode {
    pub fn position(&self) -> Vec2 {
        match &self.action {
            Some(action) => self.origin + action.displacement_at(self.action_time),
            None => self.origin,
        }
    }

    /// Texture currently shown, following any texture animation
    pub fn texture(&self) -> Option<&str> {
        let animated = self
            .action
            .as_ref()
            .and_then(|a| a.texture_at(self.action_time));
        match (&self.spec.kind, animated) {
            (_, Some(tex)) => Some(tex),
            (NodeKind::Sprite { texture }, None) => Some(texture.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    interval_secs: f32,
    elapsed: f32,
}

/// In-process [`SceneHost`] for tests and the native demo
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    nodes: BTreeMap<NodeId, SceneNode>,
    timers: Vec<Timer>,
    moving_speed: f32,
    gravity: Vec2,
    clock: f64,
    next_node: u32,
    next_timer: u32,
    log: Vec<SceneCommand>,
    expired: u32,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            timers: Vec::new(),
            moving_speed: 1.0,
            gravity: Vec2::ZERO,
            clock: 0.0,
            next_node: 1,
            next_timer: 1,
            log: Vec::new(),
            expired: 0,
        }
    }

    /// Advance the clock, run actions and return the timer firings as events
    pub fn advance(&mut self, dt: f32) -> Vec<GameEvent> {
        self.clock += dt as f64;

        let mut events = Vec::new();
        for timer in &mut self.timers {
            timer.elapsed += dt;
            let interval = timer.interval_secs;
            if interval.is_nan() || interval <= 0.0 || timer.elapsed < interval {
                continue;
            }
            let due = (timer.elapsed / interval).floor() as usize;
            let fired = due.min(MAX_FIRES_PER_ADVANCE);
            if fired < due {
                log::warn!("Timer {:?} dropped {} firings", timer.id, due - fired);
            }
            timer.elapsed = timer.elapsed.rem_euclid(interval);
            events.extend(std::iter::repeat_n(GameEvent::SpawnTick, fired));
        }

        let moving_speed = self.moving_speed;
        let mut finished = Vec::new();
        for (id, node) in &mut self.nodes {
            let Some(action) = &node.action else {
                continue;
            };
            let speed = match node.layer {
                Layer::Root => 1.0,
                Layer::Moving => moving_speed,
            };
            node.action_time += dt * speed;
            if let Some(t) = action.removal_time() {
                if node.action_time >= t {
                    finished.push(*id);
                }
            }
        }
        for id in finished {
            self.nodes.remove(&id);
            self.expired += 1;
        }

        events
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn layer_len(&self, layer: Layer) -> usize {
        self.nodes.values().filter(|n| n.layer == layer).count()
    }

    pub fn layer_speed(&self, layer: Layer) -> f32 {
        match layer {
            Layer::Root => 1.0,
            Layer::Moving => self.moving_speed,
        }
    }

    /// Text of a label node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(&id)?.spec.kind {
            NodeKind::Label { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn velocity(&self, id: NodeId) -> Option<Vec2> {
        self.nodes.get(&id).map(|n| n.velocity)
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Seconds since the scene was created
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Nodes removed by their own actions
    pub fn expired(&self) -> u32 {
        self.expired
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl SceneHost for HeadlessScene {
    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
        self.log.push(SceneCommand::SetGravity { gravity });
    }

    fn spawn(&mut self, layer: Layer, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            SceneNode {
                layer,
                origin: spec.position,
                spec,
                velocity: Vec2::ZERO,
                action: None,
                action_time: 0.0,
            },
        );
        self.log.push(SceneCommand::Spawn { node: id, layer });
        id
    }

    fn run_action(&mut self, node: NodeId, action: Action) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.origin = n.position();
            n.action = Some(action);
            n.action_time = 0.0;
        }
        self.log.push(SceneCommand::RunAction { node });
    }

    fn remove(&mut self, node: NodeId) {
        self.nodes.remove(&node);
        self.log.push(SceneCommand::Remove { node });
    }

    fn clear_layer(&mut self, layer: Layer) {
        self.nodes.retain(|_, n| n.layer != layer);
        self.log.push(SceneCommand::ClearLayer { layer });
    }

    fn set_position(&mut self, node: NodeId, position: Vec2) {
        if let Some(n) = self.nodes.get_mut(&node) {
            let current = n.position();
            n.origin += position - current;
        }
        self.log.push(SceneCommand::SetPosition { node, position });
    }

    fn set_velocity(&mut self, node: NodeId, velocity: Vec2) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.velocity = velocity;
        }
        self.log.push(SceneCommand::SetVelocity { node, velocity });
    }

    fn apply_impulse(&mut self, node: NodeId, impulse: Vec2) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.velocity += impulse;
        }
        self.log.push(SceneCommand::ApplyImpulse { node, impulse });
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if let NodeKind::Label { text: current, .. } = &mut n.spec.kind {
                *current = text.to_string();
            }
        }
        self.log.push(SceneCommand::SetText {
            node,
            text: text.to_string(),
        });
    }

    fn set_layer_speed(&mut self, layer: Layer, speed: f32) {
        if layer == Layer::Moving {
            self.moving_speed = speed.max(0.0);
        }
        self.log.push(SceneCommand::SetLayerSpeed { layer, speed });
    }

    fn start_timer(&mut self, interval_secs: f32) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer {
            id,
            interval_secs,
            elapsed: 0.0,
        });
        self.log.push(SceneCommand::StartTimer {
            timer: id,
            interval_secs,
        });
        id
    }

    fn cancel_timer(&mut self, timer: TimerId) {
        self.timers.retain(|t| t.id != timer);
        self.log.push(SceneCommand::CancelTimer { timer });
    }
}
