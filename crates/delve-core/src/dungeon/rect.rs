//! Inclusive grid rectangles

use serde::{Deserialize, Serialize};

use crate::{COLNO, ROWNO};

/// An inclusive rectangle of grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left x coordinate
    pub lx: usize,
    /// Top y coordinate
    pub ly: usize,
    /// Right x coordinate
    pub hx: usize,
    /// Bottom y coordinate
    pub hy: usize,
}

impl Rect {
    /// Create a new rectangle, normalising the corner order
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self {
            lx: x1.min(x2),
            ly: y1.min(y2),
            hx: x1.max(x2),
            hy: y1.max(y2),
        }
    }

    /// The whole map
    pub const fn full_map() -> Self {
        Self {
            lx: 0,
            ly: 0,
            hx: COLNO - 1,
            hy: ROWNO - 1,
        }
    }

    pub fn width(&self) -> usize {
        self.hx - self.lx + 1
    }

    pub fn height(&self) -> usize {
        self.hy - self.ly + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains_point(&self, x: usize, y: usize) -> bool {
        x >= self.lx && x <= self.hx && y >= self.ly && y <= self.hy
    }

    /// Check if this rectangle contains another
    pub fn contains(&self, other: &Rect) -> bool {
        self.lx <= other.lx && self.hx >= other.hx && self.ly <= other.ly && self.hy >= other.hy
    }

    /// Check if this rectangle intersects another
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.hx < other.lx || self.lx > other.hx || self.hy < other.ly || self.ly > other.hy)
    }

    /// Grow by `n` cells on every side, clipped to the map
    pub fn expand(&self, n: usize) -> Rect {
        Rect {
            lx: self.lx.saturating_sub(n),
            ly: self.ly.saturating_sub(n),
            hx: (self.hx + n).min(COLNO - 1),
            hy: (self.hy + n).min(ROWNO - 1),
        }
    }

    /// Coordinates in row-major order
    pub fn points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.ly..=self.hy).flat_map(move |y| (self.lx..=self.hx).map(move |x| (x, y)))
    }
}
