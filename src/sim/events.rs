//! Change notification for the host
//!
//! The simulation publishes what happened each tick; every subscriber gets its
//! own queue and drains it when convenient (audio, HUD, effects).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::burst::GhostFoodBurst;
use super::grid::GridPosition;

/// What ended a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Wall,
    SelfBite,
    /// Ran into the echo ghost
    Ghost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    FoodEaten {
        at: GridPosition,
        score: u64,
        length: usize,
    },
    Teleported {
        pair_id: u32,
        from: GridPosition,
        to: GridPosition,
    },
    BodyThreaded {
        pair_id: u32,
        segments: usize,
        remaining: usize,
    },
    GravityNudge {
        from: GridPosition,
        to: GridPosition,
    },
    GhostBurst(GhostFoodBurst),
    GhostExpired,
    GameOver {
        cause: DeathCause,
        score: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u32);

#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u32,
    queues: BTreeMap<SubscriptionId, Vec<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.queues.insert(id, Vec::new());
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.queues.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.len()
    }

    /// Deliver to every current subscriber. Dropped when nobody listens.
    pub fn publish(&mut self, event: GameEvent) {
        for queue in self.queues.values_mut() {
            queue.push(event.clone());
        }
    }

    /// Take everything queued for `id` since the last drain
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<GameEvent> {
        self.queues
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
