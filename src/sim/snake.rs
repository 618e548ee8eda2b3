//! The player's snake
//!
//! Body is an ordered list of tiles, head first. Each step the head advances
//! one tile and every follower moves into the tile its leader stepped onto.

use std::collections::VecDeque;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, GridPosition};
use super::portal::PortalTransitRecord;
use super::rewind::Rewindable;
use crate::consts::MAX_BUFFERED_TURNS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snake {
    /// Where each segment currently is
    pub(super) segments: Vec<GridPosition>,
    /// Tile each segment stepped onto, before any portal relocation.
    /// Followers walk these, which is what carries them into a portal entry.
    pub(super) footsteps: Vec<GridPosition>,
    pub(super) direction: Direction,
    /// Turns queued between steps, applied one per step
    turn_queue: VecDeque<Direction>,
    pending_growth: u32,
    pub(super) transit: Option<PortalTransitRecord>,
}

impl Snake {
    /// Straight snake with `head` leading in `direction`. `length` of 0 is
    /// treated as 1.
    pub fn new(head: GridPosition, direction: Direction, length: usize) -> Self {
        let back = direction.opposite();
        let mut segments = Vec::with_capacity(length.max(1));
        let mut pos = head;
        for _ in 0..length.max(1) {
            segments.push(pos);
            pos = pos.step(back);
        }
        Self {
            footsteps: segments.clone(),
            segments,
            direction,
            turn_queue: VecDeque::with_capacity(MAX_BUFFERED_TURNS),
            pending_growth: 0,
            transit: None,
        }
    }

    /// Build from explicit tiles (head first)
    pub fn from_segments(segments: Vec<GridPosition>, direction: Direction) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            footsteps: segments.clone(),
            segments,
            direction,
            turn_queue: VecDeque::with_capacity(MAX_BUFFERED_TURNS),
            pending_growth: 0,
            transit: None,
        })
    }

    #[inline]
    pub fn head(&self) -> GridPosition {
        self.segments[0]
    }

    pub fn segments(&self) -> &[GridPosition] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false, a snake keeps its head
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn buffered_turns(&self) -> impl Iterator<Item = Direction> + '_ {
        self.turn_queue.iter().copied()
    }

    pub fn pending_growth(&self) -> u32 {
        self.pending_growth
    }

    pub fn transit(&self) -> Option<&PortalTransitRecord> {
        self.transit.as_ref()
    }

    /// Queue a turn. Rejects reversals and repeats of the last queued heading,
    /// and drops input once the buffer is full.
    pub fn queue_turn(&mut self, dir: Direction) -> bool {
        let last = self.turn_queue.back().copied().unwrap_or(self.direction);
        if dir == last || (dir == last.opposite() && self.len() > 1) {
            return false;
        }
        if self.turn_queue.len() >= MAX_BUFFERED_TURNS {
            return false;
        }
        self.turn_queue.push_back(dir);
        true
    }

    /// Grow by `segments` over the next steps
    pub fn grow(&mut self, segments: u32) {
        self.pending_growth += segments;
    }

    /// Advance one tile: apply one queued turn, move the head, followers walk
    /// their leader's footsteps, and the tail stays put while growing.
    pub fn step(&mut self) {
        if let Some(turn) = self.turn_queue.pop_front() {
            self.direction = turn;
        }
        let new_head = self.head().step(self.direction);
        let keep = if self.pending_growth > 0 {
            self.pending_growth -= 1;
            self.footsteps.len()
        } else {
            self.footsteps.len() - 1
        };
        let mut footsteps = Vec::with_capacity(keep + 1);
        footsteps.push(new_head);
        footsteps.extend_from_slice(&self.footsteps[..keep]);
        self.segments.clone_from(&footsteps);
        self.footsteps = footsteps;
    }

    /// Shift only the head (body segments never move)
    pub fn nudge_head(&mut self, delta: IVec2) {
        let old = self.segments[0];
        self.segments[0] = old.offset(delta);
        // A fresh teleport leaves the head's footstep on the portal entry
        if self.footsteps[0] == old {
            self.footsteps[0] = self.segments[0];
        }
    }

    /// True if the head shares a tile with any body segment
    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.segments[1..].contains(&head)
    }

    pub fn occupies(&self, pos: GridPosition) -> bool {
        self.segments.contains(&pos)
    }
}

impl Rewindable for Snake {
    type Capsule = Snake;

    fn snapshot(&self) -> Snake {
        self.clone()
    }

    fn restore(&mut self, capsule: &Snake) {
        self.clone_from(capsule);
    }
}
