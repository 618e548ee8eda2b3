//! Delayed ghost food bursts
//!
//! When the snake eats, a burst is scheduled a fixed number of ticks ahead.
//! When it comes due it goes off wherever the echo ghost's head is at that
//! moment. The queue holds nothing beyond its tick counter and pending entries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::echo_ghost::EchoGhost;
use super::grid::GridPosition;
use super::rewind::Rewindable;

/// What was eaten to schedule the burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstPayload {
    pub food: GridPosition,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstQueueEntry {
    pub fire_tick: u64,
    pub payload: BurstPayload,
}

/// A burst that went off at the ghost's head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostFoodBurst {
    pub payload: BurstPayload,
    pub tile: GridPosition,
    /// Tile centre in world units
    pub world_pos: Vec2,
}

/// Rewind capsule for [`GhostFoodBurstQueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstQueueCapsule {
    pub queue: Vec<BurstQueueEntry>,
    pub current_tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GhostFoodBurstQueue {
    delay_ticks: u32,
    cell_size: f32,
    current_tick: u64,
    /// Pending entries in enqueue order
    queue: Vec<BurstQueueEntry>,
}

impl GhostFoodBurstQueue {
    pub fn new(delay_ticks: u32, cell_size: f32) -> Self {
        Self {
            delay_ticks,
            cell_size,
            current_tick: 0,
            queue: Vec::new(),
        }
    }

    pub fn delay_ticks(&self) -> u32 {
        self.delay_ticks
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn pending(&self) -> &[BurstQueueEntry] {
        &self.queue
    }

    /// Schedule a burst; returns the tick it fires on
    pub fn enqueue(&mut self, payload: BurstPayload) -> u64 {
        let fire_tick = self.current_tick + self.delay_ticks as u64;
        self.queue.push(BurstQueueEntry { fire_tick, payload });
        fire_tick
    }

    /// Advance one tick and fire everything due, in enqueue order.
    ///
    /// Due entries are always removed. They only produce a burst if the ghost
    /// is present and playing back.
    pub fn process_tick(&mut self, ghost: Option<&EchoGhost>) -> Vec<GhostFoodBurst> {
        self.current_tick += 1;
        let now = self.current_tick;
        if !self.queue.iter().any(|e| e.fire_tick <= now) {
            return Vec::new();
        }

        let (due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|e| e.fire_tick <= now);
        self.queue = pending;

        let Some(tile) = ghost.filter(|g| g.is_active()).and_then(EchoGhost::playback_head)
        else {
            log::debug!("{} ghost bursts dropped, no active ghost", due.len());
            return Vec::new();
        };
        due.into_iter()
            .map(|entry| GhostFoodBurst {
                payload: entry.payload,
                tile,
                world_pos: tile.world_center(self.cell_size),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.current_tick = 0;
    }
}

impl Rewindable for GhostFoodBurstQueue {
    type Capsule = BurstQueueCapsule;

    fn snapshot(&self) -> BurstQueueCapsule {
        BurstQueueCapsule {
            queue: self.queue.clone(),
            current_tick: self.current_tick,
        }
    }

    fn restore(&mut self, capsule: &BurstQueueCapsule) {
        self.queue.clone_from(&capsule.queue);
        self.current_tick = capsule.current_tick;
    }
}
