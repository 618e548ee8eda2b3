//! Gravity wells: every `cadence` steps the snake's head is pulled one tile
//! toward the well's centre.
//!
//! The manager has no idea whether its biome is active; the caller only
//! invokes it while it is.

use std::num::NonZeroU32;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::GridPosition;
use super::rewind::Rewindable;
use super::snake::Snake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GravityWellState {
    /// Steps since the last nudge, always below `cadence`
    pub step_count: u32,
    pub cadence: NonZeroU32,
    pub center: GridPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravityWellManager {
    state: GravityWellState,
}

/// One-tile pull from `head` toward `center`.
///
/// Moves along the axis with the larger distance; the column axis wins an
/// exact tie. Zero when already at the centre.
pub fn compute_nudge(head: GridPosition, center: GridPosition) -> IVec2 {
    let d = head.delta_to(center);
    if d == IVec2::ZERO {
        IVec2::ZERO
    } else if d.x.abs() >= d.y.abs() {
        IVec2::new(d.x.signum(), 0)
    } else {
        IVec2::new(0, d.y.signum())
    }
}

impl GravityWellManager {
    pub fn new(center: GridPosition, cadence: NonZeroU32) -> Self {
        Self {
            state: GravityWellState {
                step_count: 0,
                cadence,
                center,
            },
        }
    }

    pub fn state(&self) -> &GravityWellState {
        &self.state
    }

    pub fn center(&self) -> GridPosition {
        self.state.center
    }

    /// Count one snake step; on the cadence step nudge the head and return
    /// true. Nudges may leave the arena, walls are checked by the caller.
    pub fn on_snake_step(&mut self, snake: &mut Snake) -> bool {
        self.state.step_count += 1;
        if self.state.step_count < self.state.cadence.get() {
            return false;
        }
        self.state.step_count = 0;
        let delta = compute_nudge(snake.head(), self.state.center);
        snake.nudge_head(delta);
        log::debug!("Gravity well nudged head by {:?} to {:?}", delta, snake.head());
        true
    }

    pub fn reset(&mut self) {
        self.state.step_count = 0;
    }

    /// Called when the well's biome shuts down
    pub fn destroy(&mut self) {
        self.reset();
    }
}

impl Rewindable for GravityWellManager {
    type Capsule = GravityWellState;

    fn snapshot(&self) -> GravityWellState {
        self.state
    }

    fn restore(&mut self, capsule: &GravityWellState) {
        self.state = *capsule;
    }
}
