//! Map cells: terrain, door state and wall info

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Cell/terrain type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellType {
    #[default]
    Stone = 0,
    VWall = 1,
    HWall = 2,
    TLCorner = 3,
    TRCorner = 4,
    BLCorner = 5,
    BRCorner = 6,
    CrossWall = 7,
    TUWall = 8,  // T-wall up
    TDWall = 9,  // T-wall down
    TLWall = 10, // T-wall left
    TRWall = 11, // T-wall right
    DBWall = 12, // Drawbridge wall
    Tree = 13,
    SecretDoor = 14,
    SecretCorridor = 15,
    Pool = 16,
    Moat = 17,
    Water = 18,
    DrawbridgeUp = 19,
    Lava = 20,
    IronBars = 21,
    Door = 22,
    Corridor = 23,
    Room = 24,
    Stairs = 25,
    Ladder = 26,
    Fountain = 27,
    Throne = 28,
    Sink = 29,
    Grave = 30,
    Altar = 31,
    Ice = 32,
    DrawbridgeDown = 33,
    Air = 34,
    Cloud = 35,
}

impl CellType {
    /// Check if this is a wall type
    pub const fn is_wall(&self) -> bool {
        (*self as u8) >= 1 && (*self as u8) <= 12
    }

    /// Check if this is a door
    pub const fn is_door(&self) -> bool {
        matches!(self, CellType::Door | CellType::SecretDoor)
    }

    /// Check if this is passable (can walk through)
    pub const fn is_passable(&self) -> bool {
        matches!(
            self,
            CellType::Room
                | CellType::Corridor
                | CellType::Door
                | CellType::Stairs
                | CellType::Ladder
                | CellType::Fountain
                | CellType::Throne
                | CellType::Sink
                | CellType::Grave
                | CellType::Altar
                | CellType::Ice
                | CellType::DrawbridgeDown
                | CellType::Air
                | CellType::Cloud
        )
    }

    /// Check if this is a liquid/water type
    pub const fn is_liquid(&self) -> bool {
        matches!(
            self,
            CellType::Pool | CellType::Moat | CellType::Water | CellType::Lava
        )
    }

    /// Check if this is diggable
    pub const fn is_diggable(&self) -> bool {
        matches!(
            self,
            CellType::Stone
                | CellType::VWall
                | CellType::HWall
                | CellType::TLCorner
                | CellType::TRCorner
                | CellType::BLCorner
                | CellType::BRCorner
                | CellType::CrossWall
                | CellType::TUWall
                | CellType::TDWall
                | CellType::TLWall
                | CellType::TRWall
                | CellType::Corridor
                | CellType::Room
        )
    }

    /// Terrain for a character of an ASCII level map.
    ///
    /// `x` is the transparent glyph and yields `None` without being an
    /// error; unknown characters are reported by the caller.
    pub const fn from_map_char(c: char) -> Option<Option<CellType>> {
        let typ = match c {
            ' ' => CellType::Stone,
            '#' => CellType::Corridor,
            '.' => CellType::Room,
            '-' => CellType::HWall,
            '|' => CellType::VWall,
            '+' => CellType::Door,
            'A' => CellType::Air,
            'B' => CellType::CrossWall,
            'C' => CellType::Cloud,
            'S' => CellType::SecretDoor,
            'H' => CellType::SecretCorridor,
            '{' => CellType::Fountain,
            '\\' => CellType::Throne,
            'K' => CellType::Sink,
            '}' => CellType::Moat,
            'P' => CellType::Pool,
            'L' => CellType::Lava,
            'I' => CellType::Ice,
            'W' => CellType::Water,
            'T' => CellType::Tree,
            'F' => CellType::IronBars,
            'x' => return Some(None),
            _ => return None,
        };
        Some(Some(typ))
    }

    /// Get the display character for this cell type
    pub const fn symbol(&self) -> char {
        match self {
            CellType::Stone => ' ',
            CellType::VWall => '|',
            CellType::HWall => '-',
            CellType::TLCorner => '-',
            CellType::TRCorner => '-',
            CellType::BLCorner => '-',
            CellType::BRCorner => '-',
            CellType::CrossWall => '-',
            CellType::TUWall => '-',
            CellType::TDWall => '-',
            CellType::TLWall => '|',
            CellType::TRWall => '|',
            CellType::DBWall => '|',
            CellType::Tree => '#',
            CellType::SecretDoor => '+',
            CellType::SecretCorridor => '#',
            CellType::Pool => '}',
            CellType::Moat => '}',
            CellType::Water => '}',
            CellType::DrawbridgeUp => '#',
            CellType::Lava => '}',
            CellType::IronBars => '#',
            CellType::Door => '+',
            CellType::Corridor => '#',
            CellType::Room => '.',
            CellType::Stairs => '>',
            CellType::Ladder => '>',
            CellType::Fountain => '{',
            CellType::Throne => '\\',
            CellType::Sink => '#',
            CellType::Grave => '|',
            CellType::Altar => '_',
            CellType::Ice => '.',
            CellType::DrawbridgeDown => '.',
            CellType::Air => ' ',
            CellType::Cloud => '#',
        }
    }
}

bitflags! {
    /// Door state flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DoorState: u8 {
        const NO_DOOR = 0x00;
        const BROKEN = 0x01;
        const OPEN = 0x02;
        const CLOSED = 0x04;
        const LOCKED = 0x08;
        const TRAPPED = 0x10;
    }
}

// Manual serde impl for DoorState
impl Serialize for DoorState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DoorState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(DoorState::from_bits_truncate(bits))
    }
}

/// Altar alignment, stored in the cell flags of an altar
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Alignment {
    #[default]
    Unaligned = 0,
    Lawful = 1,
    Neutral = 2,
    Chaotic = 3,
}

impl Alignment {
    /// One draw among the three player alignments
    pub fn random(rng: &mut crate::rng::GameRng) -> Self {
        match rng.rn2(3) {
            0 => Alignment::Lawful,
            1 => Alignment::Neutral,
            _ => Alignment::Chaotic,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Alignment::Lawful,
            2 => Alignment::Neutral,
            3 => Alignment::Chaotic,
            _ => Alignment::Unaligned,
        }
    }
}

/// A single map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Actual terrain type
    pub typ: CellType,

    /// Cell flags (door state for doors)
    pub flags: u8,

    /// Currently lit
    pub lit: bool,

    /// Directions the cell has been seen from; owned by vision code
    pub seen_from: u8,

    /// Room number (0 = not in room, otherwise index + 1)
    pub room_number: u8,

    /// Scripted wall info: digging is refused here
    pub non_diggable: bool,

    /// Scripted wall info: phasing through is refused here
    pub non_passable: bool,
}

impl Cell {
    /// Create a new stone cell
    pub const fn stone() -> Self {
        Self {
            typ: CellType::Stone,
            flags: 0,
            lit: false,
            seen_from: 0,
            room_number: 0,
            non_diggable: false,
            non_passable: false,
        }
    }

    /// Create a lit floor cell
    pub const fn floor() -> Self {
        Self {
            typ: CellType::Room,
            lit: true,
            ..Self::stone()
        }
    }

    /// Get door state from flags
    pub fn door_state(&self) -> DoorState {
        DoorState::from_bits_truncate(self.flags)
    }

    /// Set door state
    pub fn set_door_state(&mut self, state: DoorState) {
        self.flags = state.bits();
    }

    /// Turn the cell into an altar of the given alignment
    pub fn make_altar(&mut self, alignment: Alignment) {
        self.typ = CellType::Altar;
        self.flags = alignment as u8;
    }

    /// Alignment of an altar cell
    pub fn altar_alignment(&self) -> Option<Alignment> {
        (self.typ == CellType::Altar).then(|| Alignment::from_bits(self.flags))
    }

    /// Digging allowed, combining terrain and scripted wall info
    pub fn can_dig(&self) -> bool {
        self.typ.is_diggable() && !self.non_diggable
    }
}
