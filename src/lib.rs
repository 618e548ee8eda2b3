//! Echo Snake - a grid arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, snake, echo ghost, portals, gravity wells, rewind)
//! - `settings`: Data-driven configuration with validation
//!
//! Rendering, input mapping and persistence belong to the host.

pub mod settings;
pub mod sim;

pub use settings::{ArenaConfig, ConfigError, SimConfig};
pub use sim::{GameState, Simulation};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step (8 moves per second)
    pub const STEP_MS: f64 = 125.0;

    /// Arena dimensions in tiles
    pub const ARENA_COLS: i32 = 32;
    pub const ARENA_ROWS: i32 = 24;
    /// Tile edge length in world units
    pub const CELL_SIZE: f32 = 20.0;

    /// Snake defaults
    pub const START_LENGTH: usize = 3;
    /// Buffered turn inputs kept between steps
    pub const MAX_BUFFERED_TURNS: usize = 2;
    pub const FOOD_SCORE: u64 = 10;

    /// Echo ghost defaults (replays the snake 2.5 seconds late)
    pub const GHOST_DELAY_MS: f64 = 2500.0;
    pub const GHOST_BUFFER_CAPACITY: usize = 64;
    /// Samples over which the ghost fades once recording stops
    pub const GHOST_TRAIL_WINDOW: usize = 10;
    /// A ghost never gets more opaque than this
    pub const GHOST_MAX_OPACITY: f32 = 0.35;

    /// Gravity well default cadence (steps between nudges)
    pub const GRAVITY_CADENCE: u32 = 4;
}
