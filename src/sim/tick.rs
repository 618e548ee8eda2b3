//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Order within a
//! tick: movement, collisions (walls, portals, body, ghost, food), ghost
//! recording, body threading, gravity, then ghost food bursts.

use std::num::NonZeroU32;

use super::burst::BurstPayload;
use super::clock::{GridClock, GridClockCapsule};
use super::collision;
use super::echo_ghost::EchoGhostState;
use super::events::{DeathCause, GameEvent, SubscriptionId};
use super::grid::{Direction, GridPosition};
use super::portal::PortalLink;
use super::rewind::Rewindable;
use super::state::{GamePhase, GameState, GameStateCapsule};
use crate::consts::FOOD_SCORE;
use crate::settings::{ConfigError, SimConfig};

/// Advance the game state by one grid step
pub fn tick(state: &mut GameState) {
    state.time_ticks += 1;

    if state.phase == GamePhase::GameOver {
        drain_ghost(state);
        fire_bursts(state);
        return;
    }

    state.snake.step();

    if let Some(cause) = resolve_collisions(state) {
        end_run(state, cause);
        fire_bursts(state);
        return;
    }

    state.ghost.record(state.snake.segments());
    thread_body(state);
    apply_gravity(state);
    fire_bursts(state);
}

/// Walls, portals, body and ghost contact, then food. Returns the cause of
/// death if the move was fatal.
fn resolve_collisions(state: &mut GameState) -> Option<DeathCause> {
    let head = state.snake.head();
    if collision::hits_wall(head, &state.config.arena) {
        return Some(DeathCause::Wall);
    }

    if let Some((pair_id, exit)) = collision::portal_exit(head, &state.portals) {
        state.snake.teleport_head(exit, Some(PortalLink { pair_id, entry: head }));
        log::info!("Teleported through portal {}: {:?} -> {:?}", pair_id, head, exit);
        state.events.publish(GameEvent::Teleported {
            pair_id,
            from: head,
            to: exit,
        });
    }

    if let Some(cause) = collision::body_hazard(&state.snake, &state.ghost) {
        return Some(cause);
    }

    if state.food == Some(state.snake.head()) {
        eat_food(state);
    }
    None
}

fn eat_food(state: &mut GameState) {
    let at = state.snake.head();
    state.snake.grow(1);
    state.score += FOOD_SCORE;
    let fire_tick = state.bursts.enqueue(BurstPayload {
        food: at,
        score: FOOD_SCORE,
    });
    log::debug!("Food eaten at {:?}, burst due on tick {}", at, fire_tick);
    state.events.publish(GameEvent::FoodEaten {
        at,
        score: state.score,
        length: state.snake.len() + state.snake.pending_growth() as usize,
    });
    state.spawn_food();
}

fn end_run(state: &mut GameState, cause: DeathCause) {
    state.phase = GamePhase::GameOver;
    state.ghost.stop_recording();
    log::info!("Game over ({:?}) with score {}", cause, state.score);
    state.events.publish(GameEvent::GameOver {
        cause,
        score: state.score,
    });
    // Nothing recorded yet: the ghost is gone at once
    if state.ghost.state() == EchoGhostState::Expired {
        state.events.publish(GameEvent::GhostExpired);
    }
}

fn drain_ghost(state: &mut GameState) {
    if state.ghost.state() == EchoGhostState::FadingOut && state.ghost.advance_fade_out() {
        state.events.publish(GameEvent::GhostExpired);
    }
}

fn thread_body(state: &mut GameState) {
    let Some(pair_id) = state.snake.transit().map(|t| t.portal_pair_id) else {
        return;
    };
    let segments = state.snake.resolve_body_threading();
    if segments > 0 {
        let remaining = state.snake.transit().map_or(0, |t| t.segments_remaining);
        state.events.publish(GameEvent::BodyThreaded {
            pair_id,
            segments,
            remaining,
        });
    }
}

/// Nudge the head toward the well. The landing tile is not collision
/// checked: the next tick moves the head on before collisions run, so a
/// nudge onto body, ghost, food or a portal has no effect.
fn apply_gravity(state: &mut GameState) {
    let Some(well) = state.gravity.as_mut() else {
        return;
    };
    let from = state.snake.head();
    if well.on_snake_step(&mut state.snake) {
        state.events.publish(GameEvent::GravityNudge {
            from,
            to: state.snake.head(),
        });
    }
}

fn fire_bursts(state: &mut GameState) {
    for burst in state.bursts.process_tick(Some(&state.ghost)) {
        state.events.publish(GameEvent::GhostBurst(burst));
    }
}

/// Clock-driven host around [`GameState`]
#[derive(Debug)]
pub struct Simulation {
    clock: GridClock,
    state: GameState,
}

/// Rewind capsule for [`Simulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationCapsule {
    pub clock: GridClockCapsule,
    pub state: GameStateCapsule,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let clock = GridClock::new(config.step_ms)?;
        let state = GameState::new(config)?;
        Ok(Self { clock, state })
    }

    /// Feed frame time; runs every whole tick it covers and returns the count
    pub fn update(&mut self, delta_ms: f64) -> u32 {
        let ticks = self.clock.advance(delta_ms);
        for _ in 0..ticks {
            tick(&mut self.state);
        }
        ticks
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn clock(&self) -> &GridClock {
        &self.clock
    }

    /// Interpolation factor for rendering between ticks
    pub fn progress(&self) -> f64 {
        self.clock.progress()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn queue_turn(&mut self, dir: Direction) -> bool {
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        self.state.snake.queue_turn(dir)
    }

    pub fn add_portal_pair(&mut self, a: GridPosition, b: GridPosition) -> Option<u32> {
        self.state.add_portal_pair(a, b)
    }

    pub fn activate_gravity_well(&mut self, center: GridPosition, cadence: NonZeroU32) {
        self.state.activate_gravity_well(center, cadence);
    }

    pub fn deactivate_gravity_well(&mut self) {
        self.state.deactivate_gravity_well();
    }

    pub fn subscribe_events(&mut self) -> SubscriptionId {
        self.state.events.subscribe()
    }

    pub fn drain_events(&mut self, id: SubscriptionId) -> Vec<GameEvent> {
        self.state.events.drain(id)
    }

    pub fn restart(&mut self) {
        self.clock.reset();
        self.state.restart();
    }
}

impl Rewindable for Simulation {
    type Capsule = SimulationCapsule;

    fn snapshot(&self) -> SimulationCapsule {
        SimulationCapsule {
            clock: self.clock.snapshot(),
            state: self.state.snapshot(),
        }
    }

    fn restore(&mut self, capsule: &SimulationCapsule) {
        self.clock.restore(&capsule.clock);
        self.state.restore(&capsule.state);
    }
}
