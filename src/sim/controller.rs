//! Gameplay controller
//!
//! Owns the game state and turns host events (tap, spawn tick, contact) into
//! state transitions plus scene commands.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::host::{Action, Body, BodyShape, Layer, NodeSpec, SceneHost};
use super::state::{Category, GameEvent, GamePhase, GameState, PipePair};
use crate::consts::*;
use crate::tuning::Tuning;

const BIRD_TEXTURES: [&str; 2] = ["flappy1.png", "flappy2.png"];
const BACKGROUND_TEXTURE: &str = "bg.png";
const PIPE_UP_TEXTURE: &str = "pipe1.png";
const PIPE_DOWN_TEXTURE: &str = "pipe2.png";

/// The single gameplay component
#[derive(Debug, Clone)]
pub struct GameplayController<R = Pcg32> {
    tuning: Tuning,
    state: GameState,
    rng: R,
}

impl GameplayController<Pcg32> {
    /// Controller with a seeded PCG random source
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self::with_rng(tuning, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> GameplayController<R> {
    pub fn with_rng(tuning: Tuning, rng: R) -> Self {
        let state = GameState::new(&tuning);
        Self { tuning, state, rng }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Build the scene: labels, background, bird, ground and the spawn timer
    pub fn start<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        let t = &self.tuning;
        let center = t.frame_center();

        host.set_gravity(Vec2::new(0.0, t.gravity_y));

        let score_pos = Vec2::new(center.x, t.frame_height - SCORE_LABEL_INSET);
        self.state.score_label = Some(host.spawn(
            Layer::Root,
            NodeSpec::label("0", LABEL_FONT, SCORE_FONT_SIZE, score_pos, Z_SCORE),
        ));

        self.make_background(host);

        let t = &self.tuning;
        let bird_body = Body {
            shape: BodyShape::Circle {
                radius: t.bird_width / 2.0,
            },
            dynamic: true,
            allows_rotation: false,
            category: Category::BIRD,
            collision: Category::OBJECT,
            contact: Category::OBJECT | Category::GAP,
        };
        let bird = host.spawn(
            Layer::Root,
            NodeSpec::sprite(BIRD_TEXTURES[0], center, t.bird_size(), Z_BIRD).with_body(bird_body),
        );
        host.run_action(
            bird,
            Action::RepeatForever(Box::new(Action::Animate {
                textures: BIRD_TEXTURES.iter().map(|s| s.to_string()).collect(),
                frame_secs: t.flap_frame_secs,
            })),
        );
        self.state.bird.node = Some(bird);
        self.state.bird.pos = center;
        self.state.bird.vel = Vec2::ZERO;

        // Invisible ground strip along the bottom edge
        let ground_size = Vec2::new(t.frame_width * 2.0, 1.0);
        host.spawn(
            Layer::Root,
            NodeSpec::empty(Vec2::ZERO, ground_size, 0.0).with_body(Body::fixed(
                BodyShape::Rect { size: ground_size },
                Category::OBJECT,
            )),
        );

        log::info!(
            "Scene started ({}x{}), spawning every {}s",
            t.frame_width,
            t.frame_height,
            t.spawn_interval_secs
        );

        self.start_spawn_timer(host);
        self.state.phase = GamePhase::Playing;
    }

    /// Single entry point for host events
    pub fn handle<H: SceneHost + ?Sized>(&mut self, event: GameEvent, host: &mut H) {
        match event {
            GameEvent::Tap => self.on_tap(host),
            GameEvent::SpawnTick => self.on_spawn_tick(host),
            GameEvent::Contact { a, b } => self.on_contact(a, b, host),
        }
    }

    /// Flap while playing, restart the run after game over
    pub fn on_tap<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        match self.state.phase {
            GamePhase::Playing => {
                let impulse = Vec2::new(0.0, self.tuning.tap_impulse);
                self.state.bird.vel = Vec2::ZERO;
                self.state.bird.vel += impulse;
                if let Some(bird) = self.state.bird.node {
                    host.set_velocity(bird, Vec2::ZERO);
                    host.apply_impulse(bird, impulse);
                }
                log::debug!("Flap");
            }
            GamePhase::GameOver => self.reset(host),
        }
    }

    /// Spawn one pipe pair at the right edge of the frame
    pub fn on_spawn_tick<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        if !self.state.is_playing() {
            log::debug!("Spawn tick ignored after game over");
            return;
        }

        let t = &self.tuning;
        let height = t.frame_height;
        let range = ((height / 2.0) as u32).max(1);
        let offset = self.rng.random_range(0..range) as f32 - height / 4.0;

        let gap_height = t.gap_height();
        let pipe = t.pipe_size();
        let mid_y = t.frame_center().y + offset;
        let x = t.frame_width + pipe.x;

        let crossing = t.pipe_crossing_secs();
        let move_and_remove = Action::Sequence(vec![
            Action::MoveBy {
                delta: Vec2::new(-t.pipe_travel(), 0.0),
                secs: crossing,
            },
            Action::Remove,
        ]);

        let upper_pos = Vec2::new(x, mid_y + pipe.y / 2.0 + gap_height / 2.0);
        let upper = host.spawn(
            Layer::Moving,
            NodeSpec::sprite(PIPE_UP_TEXTURE, upper_pos, pipe, Z_PIPE_UP).with_body(Body::fixed(
                BodyShape::Rect { size: pipe },
                Category::OBJECT,
            )),
        );
        host.run_action(upper, move_and_remove.clone());

        let lower_pos = Vec2::new(x, mid_y - pipe.y / 2.0 - gap_height / 2.0);
        let lower = host.spawn(
            Layer::Moving,
            NodeSpec::sprite(PIPE_DOWN_TEXTURE, lower_pos, pipe, Z_PIPE_DOWN).with_body(
                Body::fixed(BodyShape::Rect { size: pipe }, Category::OBJECT),
            ),
        );
        host.run_action(lower, move_and_remove.clone());

        let gap_pos = Vec2::new(x, mid_y);
        let gap_size = Vec2::new(pipe.x, gap_height);
        let gap = host.spawn(
            Layer::Moving,
            NodeSpec::empty(gap_pos, gap_size, Z_GAP)
                .with_body(Body::fixed(BodyShape::Rect { size: gap_size }, Category::GAP)),
        );
        host.run_action(gap, move_and_remove);

        let speed = t.pipe_travel() / crossing;
        log::debug!("Spawned pipe pair offset={:.1} gap={:.1}", offset, gap_height);

        self.state.pipes_spawned += 1;
        self.state.last_pair = Some(PipePair {
            upper,
            lower,
            gap,
            offset,
            gap_height,
            upper_pos,
            lower_pos,
            gap_pos,
            speed,
        });
    }

    /// Score on gap sensors, end the run on anything else
    pub fn on_contact<H: SceneHost + ?Sized>(&mut self, a: Category, b: Category, host: &mut H) {
        if a == Category::GAP || b == Category::GAP {
            self.state.score += 1;
            if let Some(label) = self.state.score_label {
                host.set_text(label, &self.state.score.to_string());
            }
            log::debug!("Score {}", self.state.score);
        } else if self.state.phase != GamePhase::GameOver {
            self.game_over(host);
        }
    }

    /// Mirror the host's physics state for the bird
    pub fn sync_bird(&mut self, pos: Vec2, vel: Vec2) {
        self.state.bird.pos = pos;
        self.state.bird.vel = vel;
    }

    fn game_over<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.state.phase = GamePhase::GameOver;
        self.state.runs += 1;

        self.state.world_speed = 0.0;
        host.set_layer_speed(Layer::Moving, 0.0);

        if let Some(timer) = self.state.spawn_timer.take() {
            host.cancel_timer(timer);
        }

        let center = self.tuning.frame_center();
        self.state.game_over_label = Some(host.spawn(
            Layer::Root,
            NodeSpec::label(
                GAME_OVER_TEXT,
                LABEL_FONT,
                GAME_OVER_FONT_SIZE,
                center,
                Z_GAME_OVER,
            ),
        ));

        log::info!(
            "Game over with score {} after {} pipes",
            self.state.score,
            self.state.pipes_spawned
        );
    }

    fn reset<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.state.score = 0;
        if let Some(label) = self.state.score_label {
            host.set_text(label, "0");
        }

        host.clear_layer(Layer::Moving);
        self.state.pipes_spawned = 0;
        self.state.last_pair = None;
        self.make_background(host);

        self.start_spawn_timer(host);

        let center = self.tuning.frame_center();
        self.state.bird.pos = center;
        self.state.bird.vel = Vec2::ZERO;
        if let Some(bird) = self.state.bird.node {
            host.set_position(bird, center);
            host.set_velocity(bird, Vec2::ZERO);
        }

        if let Some(label) = self.state.game_over_label.take() {
            host.remove(label);
        }

        self.state.world_speed = 1.0;
        host.set_layer_speed(Layer::Moving, 1.0);

        self.state.phase = GamePhase::Playing;
        log::info!("Run restarted");
    }

    /// Scrolling background tiles that loop forever
    fn make_background<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        let t = &self.tuning;
        let w = t.background_width;
        let scroll = Action::RepeatForever(Box::new(Action::Sequence(vec![
            Action::MoveBy {
                delta: Vec2::new(-w, 0.0),
                secs: t.background_scroll_secs,
            },
            Action::MoveBy {
                delta: Vec2::new(w, 0.0),
                secs: 0.0,
            },
        ])));

        for i in 0..t.background_tiles {
            let pos = Vec2::new(w / 2.0 + w * i as f32, t.frame_center().y);
            let size = Vec2::new(w, t.frame_height);
            let tile = host.spawn(
                Layer::Moving,
                NodeSpec::sprite(BACKGROUND_TEXTURE, pos, size, Z_BACKGROUND),
            );
            host.run_action(tile, scroll.clone());
        }
    }

    fn start_spawn_timer<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.state.spawn_timer = Some(host.start_timer(self.tuning.spawn_interval_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::{HeadlessScene, SceneCommand};
    use proptest::prelude::*;

    fn started(seed: u64) -> (GameplayController, HeadlessScene) {
        let mut scene = HeadlessScene::new();
        let mut game = GameplayController::new(Tuning::default(), seed);
        game.start(&mut scene);
        scene.clear_log();
        (game, scene)
    }

    fn pipe_hit() -> GameEvent {
        GameEvent::Contact {
            a: Category::BIRD,
            b: Category::OBJECT,
        }
    }

    fn gap_hit() -> GameEvent {
        GameEvent::Contact {
            a: Category::GAP,
            b: Category::BIRD,
        }
    }

    #[test]
    fn test_start_builds_scene() {
        let mut scene = HeadlessScene::new();
        let mut game = GameplayController::new(Tuning::default(), 1);
        game.start(&mut scene);

        assert!(game.state().is_playing());
        assert!(game.state().spawn_timer.is_some());
        assert_eq!(scene.active_timers(), 1);
        assert_eq!(scene.gravity(), Vec2::new(0.0, GRAVITY_Y));
        // Score label, bird, ground on root; background tiles on the moving layer
        assert_eq!(scene.layer_len(Layer::Root), 3);
        assert_eq!(scene.layer_len(Layer::Moving), BACKGROUND_TILES as usize);
        let label = game.state().score_label.unwrap();
        assert_eq!(scene.text(label), Some("0"));

        let bird = scene.node(game.state().bird.node.unwrap()).unwrap();
        let body = bird.spec.body.unwrap();
        assert_eq!(body.category, Category::BIRD);
        assert_eq!(body.collision, Category::OBJECT);
        assert_eq!(body.contact, Category::OBJECT | Category::GAP);
        assert_eq!(bird.position(), Tuning::default().frame_center());
    }

    #[test]
    fn test_tap_resets_velocity_then_single_impulse() {
        let (mut game, mut scene) = started(1);
        let bird = game.state().bird.node.unwrap();
        game.sync_bird(Vec2::new(384.0, 300.0), Vec2::new(0.0, -42.0));

        game.handle(GameEvent::Tap, &mut scene);

        assert_eq!(
            scene.commands(),
            &[
                SceneCommand::SetVelocity {
                    node: bird,
                    velocity: Vec2::ZERO
                },
                SceneCommand::ApplyImpulse {
                    node: bird,
                    impulse: Vec2::new(0.0, TAP_IMPULSE)
                },
            ]
        );
        assert_eq!(game.state().bird.vel, Vec2::new(0.0, TAP_IMPULSE));
        assert_eq!(scene.velocity(bird), Some(Vec2::new(0.0, TAP_IMPULSE)));
    }

    #[test]
    fn test_spawn_tick_creates_one_pair_at_right_edge() {
        let (mut game, mut scene) = started(7);
        let before = scene.layer_len(Layer::Moving);

        game.handle(GameEvent::SpawnTick, &mut scene);

        assert_eq!(scene.layer_len(Layer::Moving), before + 3);
        assert_eq!(game.state().pipes_spawned, 1);
        let pair = game.state().last_pair.clone().unwrap();
        let t = Tuning::default();
        assert_eq!(pair.gap_height, 4.0 * t.bird_height);
        assert_eq!(pair.gap_pos.x, t.frame_width + t.pipe_width);
        assert_eq!(pair.upper_pos.x, pair.gap_pos.x);
        assert_eq!(pair.lower_pos.x, pair.gap_pos.x);
        let spread = pair.upper_pos.y - pair.lower_pos.y;
        assert!((spread - (t.pipe_height + pair.gap_height)).abs() < 1e-3);

        let gap = scene.node(pair.gap).unwrap();
        assert_eq!(gap.spec.body.unwrap().category, Category::GAP);
        assert_eq!(gap.spec.size, Vec2::new(t.pipe_width, pair.gap_height));
    }

    #[test]
    fn test_pipes_expire_after_crossing() {
        let (mut game, mut scene) = started(3);
        game.handle(GameEvent::SpawnTick, &mut scene);
        let pair = game.state().last_pair.clone().unwrap();
        let crossing = Tuning::default().pipe_crossing_secs();

        scene.advance(crossing * 0.5);
        let halfway = scene.node(pair.upper).unwrap().position();
        assert!(halfway.x < pair.upper_pos.x);

        scene.advance(crossing * 0.5 + 0.01);
        assert!(scene.node(pair.upper).is_none());
        assert!(scene.node(pair.lower).is_none());
        assert!(scene.node(pair.gap).is_none());
    }

    #[test]
    fn test_three_gap_contacts_score() {
        let (mut game, mut scene) = started(1);
        let label = game.state().score_label.unwrap();
        for expected in 1..=3 {
            game.handle(gap_hit(), &mut scene);
            assert_eq!(game.state().score, expected);
            assert_eq!(game.state().phase, GamePhase::Playing);
            assert_eq!(scene.text(label), Some(expected.to_string().as_str()));
        }
    }

    #[test]
    fn test_obstacle_contact_ends_run_once() {
        let (mut game, mut scene) = started(1);
        game.handle(pipe_hit(), &mut scene);

        assert_eq!(game.state().phase, GamePhase::GameOver);
        assert!(game.state().spawn_timer.is_none());
        assert_eq!(scene.active_timers(), 0);
        assert_eq!(scene.layer_speed(Layer::Moving), 0.0);
        let label = game.state().game_over_label.unwrap();
        assert_eq!(scene.text(label), Some(GAME_OVER_TEXT));

        let commands = scene.commands().len();
        game.handle(pipe_hit(), &mut scene);
        game.handle(
            GameEvent::Contact {
                a: Category::OBJECT,
                b: Category::BIRD,
            },
            &mut scene,
        );
        assert_eq!(scene.commands().len(), commands);
        assert_eq!(game.state().runs, 1);
    }

    #[test]
    fn test_gap_contact_scores_during_game_over() {
        let (mut game, mut scene) = started(1);
        game.handle(gap_hit(), &mut scene);
        game.handle(pipe_hit(), &mut scene);
        assert_eq!(game.state().phase, GamePhase::GameOver);

        game.handle(gap_hit(), &mut scene);

        assert_eq!(game.state().score, 2);
        assert_eq!(scene.text(game.state().score_label.unwrap()), Some("2"));
        assert_eq!(game.state().phase, GamePhase::GameOver);
        assert!(game.state().spawn_timer.is_none());
        assert_eq!(game.state().runs, 1);
    }

    #[test]
    fn test_spawn_ignored_after_game_over() {
        let (mut game, mut scene) = started(1);
        game.handle(pipe_hit(), &mut scene);
        let before = scene.layer_len(Layer::Moving);
        game.handle(GameEvent::SpawnTick, &mut scene);
        assert_eq!(scene.layer_len(Layer::Moving), before);
        assert_eq!(game.state().pipes_spawned, 0);
    }

    #[test]
    fn test_tap_after_game_over_restarts() {
        let (mut game, mut scene) = started(1);
        for _ in 0..7 {
            game.handle(gap_hit(), &mut scene);
        }
        game.handle(GameEvent::SpawnTick, &mut scene);
        game.handle(GameEvent::SpawnTick, &mut scene);
        game.sync_bird(Vec2::new(384.0, 2.0), Vec2::new(0.0, -80.0));
        game.handle(pipe_hit(), &mut scene);
        assert_eq!(game.state().score, 7);
        let game_over_label = game.state().game_over_label.unwrap();

        game.handle(GameEvent::Tap, &mut scene);

        let state = game.state();
        let center = Tuning::default().frame_center();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(scene.text(state.score_label.unwrap()), Some("0"));
        assert_eq!(state.bird.pos, center);
        assert_eq!(state.bird.vel, Vec2::ZERO);
        assert!(state.spawn_timer.is_some());
        assert_eq!(scene.active_timers(), 1);
        assert!(state.game_over_label.is_none());
        assert!(scene.node(game_over_label).is_none());
        assert_eq!(scene.layer_speed(Layer::Moving), 1.0);
        // Old pipes gone, fresh background in place
        assert_eq!(scene.layer_len(Layer::Moving), BACKGROUND_TILES as usize);

        let bird = scene.node(state.bird.node.unwrap()).unwrap();
        assert_eq!(bird.position(), center);
        assert_eq!(bird.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_timer_drives_spawns() {
        let (mut game, mut scene) = started(5);
        let events = scene.advance(SPAWN_INTERVAL_SECS * 2.0 + 0.1);
        assert_eq!(events, vec![GameEvent::SpawnTick, GameEvent::SpawnTick]);
        for event in events {
            game.handle(event, &mut scene);
        }
        assert_eq!(game.state().pipes_spawned, 2);

        game.handle(pipe_hit(), &mut scene);
        assert!(scene.advance(SPAWN_INTERVAL_SECS * 3.0).is_empty());
    }

    #[test]
    fn test_same_seed_same_offsets() {
        let offsets = |seed| {
            let (mut game, mut scene) = started(seed);
            (0..5)
                .map(|_| {
                    game.handle(GameEvent::SpawnTick, &mut scene);
                    game.state().last_pair.as_ref().unwrap().offset
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(offsets(42), offsets(42));
    }

    proptest! {
        #[test]
        fn prop_offset_within_middle_half(seed in any::<u64>(), ticks in 1usize..20) {
            let (mut game, mut scene) = started(seed);
            let quarter = Tuning::default().frame_height / 4.0;
            for _ in 0..ticks {
                game.handle(GameEvent::SpawnTick, &mut scene);
                let offset = game.state().last_pair.as_ref().unwrap().offset;
                prop_assert!(offset >= -quarter && offset < quarter);
            }
        }

        #[test]
        fn prop_score_never_decreases(events in proptest::collection::vec(0u8..4, 0..60)) {
            let (mut game, mut scene) = started(9);
            let mut last_score = 0;
            let mut game_overs = 0;
            for e in events {
                let was_playing = game.state().is_playing();
                let event = match e {
                    0 => GameEvent::Tap,
                    1 => GameEvent::SpawnTick,
                    2 => gap_hit(),
                    _ => pipe_hit(),
                };
                game.handle(event, &mut scene);
                match event {
                    GameEvent::Tap => {
                        if !was_playing {
                            prop_assert_eq!(game.state().score, 0);
                        }
                    }
                    _ => prop_assert!(game.state().score >= last_score),
                }
                if was_playing && !game.state().is_playing() {
                    game_overs += 1;
                }
                last_score = game.state().score;
            }
            prop_assert_eq!(game.state().runs, game_overs);
        }
    }
}
