//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by id)
//! - No rendering or platform dependencies

pub mod burst;
pub mod clock;
pub mod collision;
pub mod echo_ghost;
pub mod events;
pub mod gravity;
pub mod grid;
pub mod portal;
pub mod rewind;
pub mod snake;
pub mod state;
pub mod tick;

pub use burst::{BurstPayload, GhostFoodBurst, GhostFoodBurstQueue};
pub use clock::GridClock;
pub use echo_ghost::{EchoGhost, EchoGhostConfig, EchoGhostState};
pub use events::{DeathCause, EventBus, GameEvent, SubscriptionId};
pub use gravity::{GravityWellManager, GravityWellState, compute_nudge};
pub use grid::{Direction, GridPosition};
pub use portal::{PortalLink, PortalPair, PortalTransitRecord};
pub use rewind::{RewindManager, RewindSnapshot, Rewindable};
pub use snake::Snake;
pub use state::{GamePhase, GameState, RngState};
pub use tick::{Simulation, SimulationCapsule, tick};
