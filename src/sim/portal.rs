//! Portal pairs and threading the snake's body through them
//!
//! A portal is a single-tile wormhole between two linked tiles. The head
//! jumps straight to the partner tile, but the body cannot: it keeps walking
//! the path the head took, so each follower arrives on the entry tile one tick
//! after the one ahead of it. Threading relocates those followers to the exit
//! tile in place, so segment order is never reshuffled and the length never
//! changes.

use serde::{Deserialize, Serialize};

use super::grid::GridPosition;
use super::snake::Snake;

/// Two linked portal tiles. Entering either end exits at the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalPair {
    pub id: u32,
    pub a: GridPosition,
    pub b: GridPosition,
}

impl PortalPair {
    pub fn new(id: u32, a: GridPosition, b: GridPosition) -> Self {
        Self { id, a, b }
    }

    /// The other end, if `pos` is one of ours
    pub fn partner_of(&self, pos: GridPosition) -> Option<GridPosition> {
        if pos == self.a {
            Some(self.b)
        } else if pos == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        pos == self.a || pos == self.b
    }
}

/// Which portal a teleport went through, and where the head entered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalLink {
    pub pair_id: u32,
    pub entry: GridPosition,
}

/// Body segments still on the far side of a portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalTransitRecord {
    pub portal_pair_id: u32,
    pub entry_pos: GridPosition,
    pub exit_pos: GridPosition,
    /// Counts down from `len - 1`; the record is dropped at zero
    pub segments_remaining: usize,
}

impl Snake {
    /// Move the head to `exit`, keeping direction and queued turns.
    ///
    /// With a `link` and a body to carry, opens a transit record (replacing
    /// any transit still in progress). A head-only snake never opens one.
    pub fn teleport_head(&mut self, exit: GridPosition, link: Option<PortalLink>) {
        self.segments[0] = exit;
        match link {
            Some(link) if self.segments.len() > 1 => {
                if let Some(old) = self.transit {
                    log::debug!(
                        "Portal {} transit overwritten with {} segments left",
                        old.portal_pair_id,
                        old.segments_remaining
                    );
                }
                // Followers walk into the entry tile, then get threaded
                self.footsteps[0] = link.entry;
                self.transit = Some(PortalTransitRecord {
                    portal_pair_id: link.pair_id,
                    entry_pos: link.entry,
                    exit_pos: exit,
                    segments_remaining: self.segments.len() - 1,
                });
            }
            _ => self.footsteps[0] = exit,
        }
    }

    /// Relocate every body segment sitting on the transit entry to the exit.
    ///
    /// Runs once per tick after movement. Returns how many segments moved;
    /// a second call before the next step finds nothing left to move.
    pub fn resolve_body_threading(&mut self) -> usize {
        let Some(transit) = self.transit.as_mut() else {
            return 0;
        };
        let mut threaded = 0;
        for segment in self.segments.iter_mut().skip(1) {
            if *segment == transit.entry_pos {
                *segment = transit.exit_pos;
                threaded += 1;
            }
        }
        transit.segments_remaining = transit.segments_remaining.saturating_sub(threaded);
        if transit.segments_remaining == 0 {
            log::debug!("Portal {} transit complete", transit.portal_pair_id);
            self.transit = None;
            self.footsteps.clone_from(&self.segments);
        }
        threaded
    }
}
