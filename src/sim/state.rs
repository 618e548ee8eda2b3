//! Game state and core simulation types
//!
//! Everything a run needs lives in one owned [`GameState`], passed by
//! reference into the tick. Everything except the event bus is rewindable.

use std::num::NonZeroU32;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::burst::{BurstQueueCapsule, GhostFoodBurstQueue};
use super::echo_ghost::{EchoGhost, EchoGhostCapsule};
use super::events::EventBus;
use super::gravity::GravityWellManager;
use super::grid::{Direction, GridPosition};
use super::portal::PortalPair;
use super::rewind::Rewindable;
use super::snake::Snake;
use crate::settings::{ConfigError, SimConfig};

/// Random tries before falling back to a scan for a free food tile
const FOOD_PLACEMENT_ATTEMPTS: u32 = 32;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Snake is moving
    Playing,
    /// Run ended; the ghost drains its buffer
    GameOver,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Generator for the next draw; each call moves to a fresh stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream += 1;
        rng
    }
}

/// Complete game state (deterministic)
#[derive(Debug)]
pub struct GameState {
    pub config: SimConfig,
    pub phase: GamePhase,
    pub snake: Snake,
    pub ghost: EchoGhost,
    pub bursts: GhostFoodBurstQueue,
    /// Present only while the host's gravity biome is active
    pub gravity: Option<GravityWellManager>,
    pub portals: Vec<PortalPair>,
    pub food: Option<GridPosition>,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub rng_state: RngState,
    /// Change notification for the host (not rewound)
    pub events: EventBus,
    next_portal_id: u32,
}

/// Rewind capsule for [`GameState`]
#[derive(Debug, Clone, PartialEq)]
pub struct GameStateCapsule {
    pub phase: GamePhase,
    pub snake: Snake,
    pub ghost: EchoGhostCapsule,
    pub bursts: BurstQueueCapsule,
    pub gravity: Option<GravityWellManager>,
    pub portals: Vec<PortalPair>,
    pub food: Option<GridPosition>,
    pub score: u64,
    pub time_ticks: u64,
    pub rng_state: RngState,
    pub next_portal_id: u32,
}

/// Starting snake: mid-arena, heading right
fn spawn_snake(config: &SimConfig) -> Snake {
    let head = GridPosition::new(config.arena.cols / 2, config.arena.rows / 2);
    Snake::new(head, Direction::Right, config.start_length)
}

impl GameState {
    /// Create a new game state from a validated copy of `config`
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ghost = EchoGhost::new(config.echo_ghost_config())?;
        let bursts = GhostFoodBurstQueue::new(config.burst_delay(), config.arena.cell_size);
        let mut state = Self {
            phase: GamePhase::Playing,
            snake: spawn_snake(&config),
            ghost,
            bursts,
            gravity: None,
            portals: Vec::new(),
            food: None,
            score: 0,
            time_ticks: 0,
            rng_state: RngState::new(config.seed),
            events: EventBus::new(),
            next_portal_id: 1,
            config,
        };
        state.spawn_food();
        log::info!("Game initialized with seed: {}", state.config.seed);
        Ok(state)
    }

    /// Start a fresh run with the same config, portals and subscribers
    pub fn restart(&mut self) {
        self.phase = GamePhase::Playing;
        self.snake = spawn_snake(&self.config);
        self.ghost.reset();
        self.bursts.clear();
        if let Some(well) = self.gravity.as_mut() {
            well.reset();
        }
        self.score = 0;
        self.time_ticks = 0;
        self.rng_state = RngState::new(self.config.seed);
        self.spawn_food();
        log::info!("Game restarted with seed: {}", self.config.seed);
    }

    /// Tile is open for food
    fn is_free(&self, pos: GridPosition) -> bool {
        !self.snake.occupies(pos) && !self.portals.iter().any(|p| p.contains(pos))
    }

    /// Place food on a free tile, or none if the arena is full
    pub fn spawn_food(&mut self) {
        let (cols, rows) = (self.config.arena.cols, self.config.arena.rows);
        let mut rng = self.rng_state.next_rng();
        for _ in 0..FOOD_PLACEMENT_ATTEMPTS {
            let pos = GridPosition::new(rng.random_range(0..cols), rng.random_range(0..rows));
            if self.is_free(pos) {
                self.food = Some(pos);
                return;
            }
        }
        self.food = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| GridPosition::new(col, row)))
            .find(|&pos| self.is_free(pos));
        if self.food.is_none() {
            log::warn!("No free tile left for food");
        }
    }

    /// Link two tiles. Returns the pair id, or `None` if either tile is
    /// outside the arena, already a portal, or both are the same tile.
    pub fn add_portal_pair(&mut self, a: GridPosition, b: GridPosition) -> Option<u32> {
        let arena = &self.config.arena;
        if a == b || !a.in_bounds(arena) || !b.in_bounds(arena) {
            return None;
        }
        if self.portals.iter().any(|p| p.contains(a) || p.contains(b)) {
            return None;
        }
        let id = self.next_portal_id;
        self.next_portal_id += 1;
        self.portals.push(PortalPair::new(id, a, b));
        if self.food.is_some_and(|f| f == a || f == b) {
            self.spawn_food();
        }
        log::debug!("Portal pair {} linked {:?} <-> {:?}", id, a, b);
        Some(id)
    }

    pub fn remove_portal_pair(&mut self, id: u32) -> bool {
        let before = self.portals.len();
        self.portals.retain(|p| p.id != id);
        self.portals.len() != before
    }

    /// Gravity biome switched on
    pub fn activate_gravity_well(&mut self, center: GridPosition, cadence: NonZeroU32) {
        self.gravity = Some(GravityWellManager::new(center, cadence));
    }

    /// Gravity biome switched off
    pub fn deactivate_gravity_well(&mut self) {
        if let Some(mut well) = self.gravity.take() {
            well.destroy();
        }
    }
}

impl Rewindable for GameState {
    type Capsule = GameStateCapsule;

    fn snapshot(&self) -> GameStateCapsule {
        GameStateCapsule {
            phase: self.phase,
            snake: self.snake.snapshot(),
            ghost: self.ghost.snapshot(),
            bursts: self.bursts.snapshot(),
            gravity: self.gravity.clone(),
            portals: self.portals.clone(),
            food: self.food,
            score: self.score,
            time_ticks: self.time_ticks,
            rng_state: self.rng_state,
            next_portal_id: self.next_portal_id,
        }
    }

    fn restore(&mut self, capsule: &GameStateCapsule) {
        self.phase = capsule.phase;
        self.snake.restore(&capsule.snake);
        self.ghost.restore(&capsule.ghost);
        self.bursts.restore(&capsule.bursts);
        self.gravity.clone_from(&capsule.gravity);
        self.portals.clone_from(&capsule.portals);
        self.food = capsule.food;
        self.score = capsule.score;
        self.time_ticks = capsule.time_ticks;
        self.rng_state = capsule.rng_state;
        self.next_portal_id = capsule.next_portal_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_layout() {
        let state = GameState::new(SimConfig::default()).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.snake.head(), GridPosition::new(16, 12));
        assert_eq!(state.snake.len(), 3);
        let food = state.food.unwrap();
        assert!(food.in_bounds(&state.config.arena));
        assert!(!state.snake.occupies(food));
    }

    #[test]
    fn test_food_is_deterministic_per_seed() {
        let config = SimConfig {
            seed: 1234,
            ..Default::default()
        };
        let a = GameState::new(config.clone()).unwrap();
        let b = GameState::new(config).unwrap();
        assert_eq!(a.food, b.food);
    }

    #[test]
    fn test_food_fills_last_free_tile() {
        let mut config = SimConfig::default();
        config.arena.cols = 2;
        config.arena.rows = 2;
        config.start_length = 2;
        let mut state = GameState::new(config).unwrap();
        state.snake = Snake::from_segments(
            vec![
                GridPosition::new(0, 0),
                GridPosition::new(1, 0),
                GridPosition::new(1, 1),
            ],
            Direction::Left,
        )
        .unwrap();
        state.spawn_food();
        assert_eq!(state.food, Some(GridPosition::new(0, 1)));

        state.snake = Snake::from_segments(
            vec![
                GridPosition::new(0, 0),
                GridPosition::new(1, 0),
                GridPosition::new(1, 1),
                GridPosition::new(0, 1),
            ],
            Direction::Left,
        )
        .unwrap();
        state.spawn_food();
        assert_eq!(state.food, None);
    }

    #[test]
    fn test_portal_pairs() {
        let mut state = GameState::new(SimConfig::default()).unwrap();
        let a = GridPosition::new(2, 2);
        let b = GridPosition::new(20, 3);
        let id = state.add_portal_pair(a, b).unwrap();
        assert_eq!(state.add_portal_pair(a, GridPosition::new(5, 5)), None);
        assert_eq!(state.add_portal_pair(a, a), None);
        assert_eq!(state.add_portal_pair(GridPosition::new(-1, 0), GridPosition::new(1, 1)), None);
        let other = state
            .add_portal_pair(GridPosition::new(4, 4), GridPosition::new(6, 6))
            .unwrap();
        assert_ne!(id, other);
        assert!(state.remove_portal_pair(id));
        assert!(!state.remove_portal_pair(id));
    }

    #[test]
    fn test_gravity_activation() {
        let mut state = GameState::new(SimConfig::default()).unwrap();
        state.activate_gravity_well(GridPosition::new(0, 0), NonZeroU32::new(3).unwrap());
        assert!(state.gravity.is_some());
        state.deactivate_gravity_well();
        assert!(state.gravity.is_none());
    }

    #[test]
    fn test_restore_round_trip() {
        let mut state = GameState::new(SimConfig::default()).unwrap();
        let capsule = state.snapshot();
        state.snake.step();
        state.score = 50;
        state.spawn_food();
        state.add_portal_pair(GridPosition::new(1, 1), GridPosition::new(2, 2));
        state.restore(&capsule);
        assert_eq!(state.snapshot(), capsule);
    }
}
