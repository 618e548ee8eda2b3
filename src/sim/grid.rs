//! Tile coordinates and movement directions

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::settings::ArenaConfig;

/// A tile in the arena. Column grows right, row grows down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub col: i32,
    pub row: i32,
}

impl GridPosition {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[inline]
    pub fn offset(self, delta: IVec2) -> Self {
        Self::new(self.col + delta.x, self.row + delta.y)
    }

    /// Neighbouring tile in `dir`
    #[inline]
    pub fn step(self, dir: Direction) -> Self {
        self.offset(dir.delta())
    }

    /// Vector from `self` to `other`
    #[inline]
    pub fn delta_to(self, other: GridPosition) -> IVec2 {
        IVec2::new(other.col - self.col, other.row - self.row)
    }

    pub fn in_bounds(self, arena: &ArenaConfig) -> bool {
        (0..arena.cols).contains(&self.col) && (0..arena.rows).contains(&self.row)
    }

    /// World-space centre of the tile
    pub fn world_center(self, cell_size: f32) -> Vec2 {
        Vec2::new(
            (self.col as f32 + 0.5) * cell_size,
            (self.row as f32 + 0.5) * cell_size,
        )
    }
}

/// Movement direction on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step for this direction
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::NEG_Y,
            Direction::Down => IVec2::Y,
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}
