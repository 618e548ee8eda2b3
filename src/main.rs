//! Echo Snake headless runner
//!
//! Drives the simulation with an autopilot that chases food, takes a rewind
//! checkpoint along the way, rewinds once on the first game over and logs a
//! summary. Set `ECHO_SNAKE_CONFIG` to a JSON config, or pass a seed.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;

use echo_snake::consts::GRAVITY_CADENCE;
use echo_snake::sim::{
    Direction, EchoGhostState, GameEvent, GamePhase, GameState, GridPosition, RewindManager,
    RewindSnapshot,
};
use echo_snake::{ConfigError, SimConfig, Simulation};

/// Frame length fed to the clock (60 fps)
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Hard stop for the run (two minutes of frames)
const MAX_FRAMES: u32 = 60 * 120;
/// Ticks played before the rewind checkpoint is taken
const CHECKPOINT_TICK: u64 = 40;

#[derive(Debug, Default)]
struct RunStats {
    ticks: u64,
    food: u32,
    teleports: u32,
    nudges: u32,
    bursts: u32,
    rewinds: u32,
}

impl RunStats {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::FoodEaten { .. } => self.food += 1,
            GameEvent::Teleported { .. } => self.teleports += 1,
            GameEvent::GravityNudge { .. } => self.nudges += 1,
            GameEvent::GhostBurst(_) => self.bursts += 1,
            GameEvent::GameOver { cause, score } => {
                log::info!("Run ended by {:?} at score {}", cause, score);
            }
            GameEvent::BodyThreaded { .. } | GameEvent::GhostExpired => {}
        }
    }
}

/// Safe heading that closes on the food (or the arena centre)
fn autopilot(state: &GameState) -> Option<Direction> {
    let arena = &state.config.arena;
    let target = state
        .food
        .unwrap_or(GridPosition::new(arena.cols / 2, arena.rows / 2));
    let head = state.snake.head();
    let segments = state.snake.segments();
    // The tail moves out of the way unless the snake is growing
    let body = &segments[..segments.len().saturating_sub(1)];
    let ghost = state.ghost.playback_segments();

    let mut best: Option<(i32, Direction)> = None;
    for dir in Direction::ALL {
        if dir == state.snake.direction().opposite() && segments.len() > 1 {
            continue;
        }
        let next = head.step(dir);
        if !next.in_bounds(arena) || body.contains(&next) || ghost.contains(&next) {
            continue;
        }
        let d = next.delta_to(target);
        let dist = d.x.abs() + d.y.abs();
        if best.is_none_or(|(best_dist, _)| dist < best_dist) {
            best = Some((dist, dir));
        }
    }
    best.map(|(_, dir)| dir)
}

fn load_config() -> Result<SimConfig, ConfigError> {
    if let Ok(json) = std::env::var("ECHO_SNAKE_CONFIG") {
        return SimConfig::from_json(&json);
    }
    let mut config = SimConfig::default();
    if let Some(seed) = std::env::args().nth(1).and_then(|s| s.parse().ok()) {
        config.seed = seed;
    }
    Ok(config)
}

fn run() -> Result<RunStats, ConfigError> {
    let config = load_config()?;
    let (cols, rows) = (config.arena.cols, config.arena.rows);
    let sim = Rc::new(RefCell::new(Simulation::new(config)?));

    let mut rewind = RewindManager::new();
    rewind.register("simulation", Rc::clone(&sim));

    let events = {
        let mut sim = sim.borrow_mut();
        sim.add_portal_pair(GridPosition::new(2, 2), GridPosition::new(cols - 3, rows - 3));
        if let Some(cadence) = NonZeroU32::new(GRAVITY_CADENCE) {
            sim.activate_gravity_well(GridPosition::new(cols / 4, rows / 2), cadence);
        }
        sim.subscribe_events()
    };

    let mut stats = RunStats::default();
    let mut checkpoint: Option<RewindSnapshot> = None;
    let mut rewound = false;

    for frame in 0..MAX_FRAMES {
        let ticks = {
            let mut sim = sim.borrow_mut();
            if sim.state().snake.buffered_turns().next().is_none() {
                if let Some(dir) = autopilot(sim.state()) {
                    sim.queue_turn(dir);
                }
            }
            sim.update(FRAME_MS)
        };
        stats.ticks += u64::from(ticks);
        for event in sim.borrow_mut().drain_events(events) {
            stats.record(&event);
        }

        let (phase, time_ticks, ghost_state) = {
            let sim = sim.borrow();
            (sim.phase(), sim.state().time_ticks, sim.state().ghost.state())
        };
        if checkpoint.is_none() && !rewound && time_ticks >= CHECKPOINT_TICK {
            checkpoint = Some(rewind.snapshot(f64::from(frame) * FRAME_MS));
        }
        if phase != GamePhase::GameOver {
            continue;
        }
        if let Some(snapshot) = checkpoint.take() {
            rewind.restore(&snapshot);
            rewound = true;
            stats.rewinds += 1;
            log::info!("Rewound to checkpoint at {:.0} ms", snapshot.timestamp());
            continue;
        }
        if ghost_state == EchoGhostState::Expired {
            break;
        }
    }
    Ok(stats)
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Echo Snake (headless) starting...");

    match run() {
        Ok(stats) => {
            log::info!("Run summary: {:?}", stats);
            println!(
                "ticks={} food={} teleports={} nudges={} bursts={} rewinds={}",
                stats.ticks, stats.food, stats.teleports, stats.nudges, stats.bursts, stats.rewinds
            );
        }
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on this target
}
