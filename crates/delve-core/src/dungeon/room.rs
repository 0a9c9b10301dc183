//! Room types and structures

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::Rect;
use crate::rng::GameRng;

/// Room kinds the builders can produce
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum RoomKind {
    /// Ordinary room (OROOM)
    #[default]
    Ordinary,
    /// Secret vault with gold, never joined by corridors
    Vault,
    /// Shop with shopkeeper and stock
    Shop,
    /// Zoo with sleeping monsters and gold
    Zoo,
    /// Temple with altar and priest
    Temple,
    /// Morgue with undead
    Morgue,
    /// Throne room with king/queen
    Throne,
    /// Soldier barracks
    Barracks,
    /// Swamp with pools and eels
    Swamp,
    /// Bee hive with queen bee
    Beehive,
    /// Room the hero arrives in; never stocked with monsters
    Arrival,
}

impl RoomKind {
    /// Kinds whose contents are generated after stairs are placed
    pub const fn needs_fill(&self) -> bool {
        !matches!(self, RoomKind::Ordinary | RoomKind::Arrival)
    }

    /// Smallest interior area this kind may be assigned to
    pub const fn min_area(&self) -> usize {
        match self {
            RoomKind::Shop => 12,
            _ => 9,
        }
    }
}

/// A rectangular room. Bounds are the inclusive interior; walls sit one
/// cell outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub lx: usize,
    pub ly: usize,
    pub hx: usize,
    pub hy: usize,
    /// Type of room
    pub kind: RoomKind,
    /// Whether the room is lit
    pub lit: bool,
    /// Contents still to be generated
    pub needs_fill: bool,
    /// Number of doors in this room
    pub door_count: u8,
}

impl Room {
    /// Create a new ordinary room from its interior bounds
    pub fn new(lx: usize, ly: usize, hx: usize, hy: usize) -> Self {
        Self {
            lx,
            ly,
            hx,
            hy,
            kind: RoomKind::Ordinary,
            lit: true,
            needs_fill: false,
            door_count: 0,
        }
    }

    /// Change the kind, updating the fill marker
    pub fn set_kind(&mut self, kind: RoomKind) {
        self.kind = kind;
        self.needs_fill = kind.needs_fill();
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

    /// Interior rectangle
    pub fn interior(&self) -> Rect {
        Rect::new(self.lx, self.ly, self.hx, self.hy)
    }

    /// Interior plus the surrounding walls
    pub fn bounds(&self) -> Rect {
        Rect::new(self.lx - 1, self.ly - 1, self.hx + 1, self.hy + 1)
    }

    /// Check if a point is inside the room interior
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.interior().contains_point(x, y)
    }

    /// Center of the interior
    pub fn center(&self) -> (usize, usize) {
        ((self.lx + self.hx) / 2, (self.ly + self.hy) / 2)
    }

    /// Random interior point: one draw for x, then one for y
    pub fn random_point(&self, rng: &mut GameRng) -> (usize, usize) {
        let x = self.lx + rng.rn2(self.width() as u32) as usize;
        let y = self.ly + rng.rn2(self.height() as u32) as usize;
        (x, y)
    }
}
