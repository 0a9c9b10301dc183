//! Selections: boolean regions over the map grid
//!
//! A selection is a dense bit per map position, stored row-major. Every
//! operation keeps the fixed map dimensions; coordinates outside the map
//! are rejected rather than clipped or wrapped. Iteration is row-major
//! (top row first, left to right), which is also the order in which
//! callbacks consume random draws.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CellType, Level, Rect};
use crate::rng::GameRng;
use crate::{COLNO, ROWNO};

/// Selection construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("coordinate ({x}, {y}) is outside the map")]
    OutOfBounds { x: i32, y: i32 },
}

fn check(x: i32, y: i32) -> Result<(usize, usize), SelectionError> {
    if Level::is_valid_pos(x, y) {
        Ok((x as usize, y as usize))
    } else {
        Err(SelectionError::OutOfBounds { x, y })
    }
}

/// Set of map coordinates
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    bits: Vec<bool>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Selection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Selection")
            .field("count", &self.count())
            .field("bounds", &self.bounds())
            .finish()
    }
}

impl Selection {
    /// Empty selection
    pub fn new() -> Self {
        Self {
            bits: vec![false; COLNO * ROWNO],
        }
    }

    /// Every map coordinate
    pub fn full() -> Self {
        Self {
            bits: vec![true; COLNO * ROWNO],
        }
    }

    const fn index(x: usize, y: usize) -> usize {
        y * COLNO + x
    }

    /// Single coordinate
    pub fn point(x: i32, y: i32) -> Result<Self, SelectionError> {
        let (x, y) = check(x, y)?;
        let mut sel = Self::new();
        sel.set(x, y);
        Ok(sel)
    }

    /// Filled rectangle; corners may come in any order
    pub fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, SelectionError> {
        let (x1, y1) = check(x1, y1)?;
        let (x2, y2) = check(x2, y2)?;
        Ok(Self::from_rect(&Rect::new(x1, y1, x2, y2)))
    }

    /// Filled rectangle from an in-bounds `Rect`
    pub fn from_rect(rect: &Rect) -> Self {
        let mut sel = Self::new();
        for (x, y) in rect.points() {
            sel.set(x, y);
        }
        sel
    }

    /// Border of a rectangle
    pub fn outline(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, SelectionError> {
        let (x1, y1) = check(x1, y1)?;
        let (x2, y2) = check(x2, y2)?;
        let r = Rect::new(x1, y1, x2, y2);
        let mut sel = Self::new();
        for (x, y) in r.points() {
            if x == r.lx || x == r.hx || y == r.ly || y == r.hy {
                sel.set(x, y);
            }
        }
        Ok(sel)
    }

    /// Bresenham line between two points, both ends included
    pub fn line(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, SelectionError> {
        check(x1, y1)?;
        check(x2, y2)?;
        let mut sel = Self::new();
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);
        loop {
            sel.set(x as usize, y as usize);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
        Ok(sel)
    }

    /// Every cell of the level whose terrain satisfies `pred`
    pub fn matching(level: &Level, pred: impl Fn(CellType) -> bool) -> Self {
        let mut sel = Self::new();
        for y in 0..ROWNO {
            for x in 0..COLNO {
                if pred(level.cells[x][y].typ) {
                    sel.set(x, y);
                }
            }
        }
        sel
    }

    /// 4-connected region of cells satisfying `pred`, grown from a start
    /// cell. A start cell that fails `pred` yields an empty selection.
    pub fn flood(
        level: &Level,
        x: i32,
        y: i32,
        pred: impl Fn(CellType) -> bool,
    ) -> Result<Self, SelectionError> {
        let (x, y) = check(x, y)?;
        let mut sel = Self::new();
        if !pred(level.cells[x][y].typ) {
            return Ok(sel);
        }
        let mut stack = vec![(x, y)];
        sel.set(x, y);
        while let Some((cx, cy)) = stack.pop() {
            let neighbours = [
                (cx as i32 - 1, cy as i32),
                (cx as i32 + 1, cy as i32),
                (cx as i32, cy as i32 - 1),
                (cx as i32, cy as i32 + 1),
            ];
            for (nx, ny) in neighbours {
                if !Level::is_valid_pos(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if !sel.contains(nx, ny) && pred(level.cells[nx][ny].typ) {
                    sel.set(nx, ny);
                    stack.push((nx, ny));
                }
            }
        }
        Ok(sel)
    }

    pub fn set(&mut self, x: usize, y: usize) {
        self.bits[Self::index(x, y)] = true;
    }

    pub fn unset(&mut self, x: usize, y: usize) {
        self.bits[Self::index(x, y)] = false;
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < COLNO && y < ROWNO && self.bits[Self::index(x, y)]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    fn zip_with(&self, other: &Selection, f: impl Fn(bool, bool) -> bool) -> Selection {
        Selection {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    pub fn union(&self, other: &Selection) -> Selection {
        self.zip_with(other, |a, b| a || b)
    }

    pub fn intersect(&self, other: &Selection) -> Selection {
        self.zip_with(other, |a, b| a && b)
    }

    /// Coordinates in `self` but not in `other`
    pub fn difference(&self, other: &Selection) -> Selection {
        self.zip_with(other, |a, b| a && !b)
    }

    pub fn negate(&self) -> Selection {
        Selection {
            bits: self.bits.iter().map(|&b| !b).collect(),
        }
    }

    /// Add every 8-neighbour of a selected coordinate, clipped to the map
    pub fn grow(&self) -> Selection {
        let mut out = self.clone();
        for (x, y) in self.iter() {
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if Level::is_valid_pos(nx, ny) {
                        out.set(nx as usize, ny as usize);
                    }
                }
            }
        }
        out
    }

    /// Keep only coordinates for which `pred` holds
    pub fn filter(&self, pred: impl Fn(usize, usize) -> bool) -> Selection {
        let mut out = Selection::new();
        for (x, y) in self.iter().filter(|&(x, y)| pred(x, y)) {
            out.set(x, y);
        }
        out
    }

    /// Tight bounding rectangle, `None` when empty
    pub fn bounds(&self) -> Option<Rect> {
        let mut it = self.iter();
        let (x0, y0) = it.next()?;
        let mut r = Rect::new(x0, y0, x0, y0);
        for (x, y) in it {
            r.lx = r.lx.min(x);
            r.hx = r.hx.max(x);
            r.hy = r.hy.max(y);
        }
        Some(r)
    }

    /// Selected coordinates in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| (i % COLNO, i / COLNO))
    }

    /// Uniform pick among selected coordinates: one `rn2(count)` draw, or
    /// no draw at all when the selection is empty
    pub fn random_coordinate(&self, rng: &mut GameRng) -> Option<(usize, usize)> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let pick = rng.rn2(count as u32) as usize;
        self.iter().nth(pick)
    }

    /// Visit every coordinate in row-major order
    pub fn for_each(&self, mut f: impl FnMut(usize, usize)) {
        for (x, y) in self.iter() {
            f(x, y);
        }
    }
}
