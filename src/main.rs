//! Flappy Tap native entry point
//!
//! Runs a scripted headless session against the gameplay controller and
//! prints a JSON summary. Pass a tuning JSON file as the first argument to
//! override the defaults.

use serde::Serialize;

use flappy_tap::Tuning;
use flappy_tap::sim::{
    Category, GameEvent, GamePhase, GameplayController, HeadlessScene, SceneCommand,
};

/// Frame step for the headless clock (60 Hz)
const FRAME_DT: f32 = 1.0 / 60.0;
const SESSION_SEED: u64 = 0x5eed;

#[derive(Serialize)]
struct Summary<'a> {
    phase: GamePhase,
    score: u32,
    runs: u32,
    pipes_spawned: u32,
    clock_secs: f64,
    expired_nodes: u32,
    commands: &'a [SceneCommand],
}

/// One scripted step: wait, then deliver an event
struct Step {
    wait_secs: f32,
    event: Option<GameEvent>,
}

fn script() -> Vec<Step> {
    let gap = GameEvent::Contact {
        a: Category::BIRD,
        b: Category::GAP,
    };
    let pipe = GameEvent::Contact {
        a: Category::BIRD,
        b: Category::OBJECT,
    };
    vec![
        Step {
            wait_secs: 0.5,
            event: Some(GameEvent::Tap),
        },
        Step {
            wait_secs: 3.0,
            event: Some(GameEvent::Tap),
        },
        Step {
            wait_secs: 4.0,
            event: Some(gap),
        },
        Step {
            wait_secs: 3.0,
            event: Some(gap),
        },
        Step {
            wait_secs: 3.0,
            event: Some(gap),
        },
        Step {
            wait_secs: 1.0,
            event: Some(pipe),
        },
        Step {
            wait_secs: 2.0,
            event: Some(GameEvent::Tap),
        },
        Step {
            wait_secs: 3.5,
            event: None,
        },
    ]
}

fn run(tuning: Tuning) {
    let mut scene = HeadlessScene::new();
    let mut game = GameplayController::new(tuning, SESSION_SEED);
    game.start(&mut scene);

    for step in script() {
        let mut waited = 0.0;
        while waited < step.wait_secs {
            for event in scene.advance(FRAME_DT) {
                game.handle(event, &mut scene);
            }
            waited += FRAME_DT;
        }
        if let Some(event) = step.event {
            log::info!("Scripted {:?}", event);
            game.handle(event, &mut scene);
        }
    }

    let state = game.state();
    let summary = Summary {
        phase: state.phase,
        score: state.score,
        runs: state.runs,
        pipes_spawned: state.pipes_spawned,
        clock_secs: scene.clock(),
        expired_nodes: scene.expired(),
        commands: scene.commands(),
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to encode summary: {}", e),
    }
}

fn main() {
    env_logger::init();
    log::info!("Flappy Tap (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    run(tuning);
}
