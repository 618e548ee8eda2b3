//! Head contact checks on the grid
//!
//! All checks look at the head after it has moved. Walls are tested first,
//! then portals (which may relocate the head), then the body and the ghost.

use super::echo_ghost::EchoGhost;
use super::events::DeathCause;
use super::grid::GridPosition;
use super::portal::PortalPair;
use super::snake::Snake;
use crate::settings::ArenaConfig;

/// True when `head` has left the arena
pub fn hits_wall(head: GridPosition, arena: &ArenaConfig) -> bool {
    !head.in_bounds(arena)
}

/// Portal under `head`: its pair id and the tile to exit at
pub fn portal_exit(head: GridPosition, portals: &[PortalPair]) -> Option<(u32, GridPosition)> {
    portals
        .iter()
        .find_map(|pair| pair.partner_of(head).map(|exit| (pair.id, exit)))
}

/// Fatal contact with the snake's own body or the ghost's replayed body
pub fn body_hazard(snake: &Snake, ghost: &EchoGhost) -> Option<DeathCause> {
    if snake.bites_itself() {
        return Some(DeathCause::SelfBite);
    }
    if ghost.is_active() && ghost.playback_segments().contains(&snake.head()) {
        return Some(DeathCause::Ghost);
    }
    None
}
