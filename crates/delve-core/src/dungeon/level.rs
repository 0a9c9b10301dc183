//! Level structure

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{Cell, CellType, DLevel, DoorState, Room, TrapKind};
use crate::tables::Ident;
use crate::{COLNO, ROWNO};

/// Create default cells grid
fn default_cells() -> Vec<Vec<Cell>> {
    vec![vec![Cell::stone(); ROWNO]; COLNO]
}

/// Level-wide flags a script can switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LevelFlag {
    NoTeleport,
    HardFloor,
    NoMagicMap,
    Shortsighted,
    Arboreal,
    Graveyard,
    Mazelike,
    Premapped,
}

/// Level flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFlags {
    pub no_teleport: bool,
    pub hard_floor: bool,
    pub no_magic_map: bool,
    pub shortsighted: bool,
    pub arboreal: bool,
    pub graveyard: bool,
    pub is_maze: bool,
    pub premapped: bool,
    pub has_shop: bool,
    pub has_vault: bool,
    pub has_zoo: bool,
    pub has_court: bool,
    pub has_morgue: bool,
    pub has_beehive: bool,
    pub has_barracks: bool,
    pub has_temple: bool,
    pub has_swamp: bool,
}

impl LevelFlags {
    pub fn set(&mut self, flag: LevelFlag) {
        match flag {
            LevelFlag::NoTeleport => self.no_teleport = true,
            LevelFlag::HardFloor => self.hard_floor = true,
            LevelFlag::NoMagicMap => self.no_magic_map = true,
            LevelFlag::Shortsighted => self.shortsighted = true,
            LevelFlag::Arboreal => self.arboreal = true,
            LevelFlag::Graveyard => self.graveyard = true,
            LevelFlag::Mazelike => self.is_maze = true,
            LevelFlag::Premapped => self.premapped = true,
        }
    }
}

/// What a mimic-like monster appears as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disguise {
    Object(Ident),
    Furniture(CellType),
    Monster(Ident),
}

/// Initial monster placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterPlacement {
    pub x: usize,
    pub y: usize,
    pub ident: Ident,
    pub asleep: bool,
    pub peaceful: bool,
    pub disguise: Option<Disguise>,
}

impl MonsterPlacement {
    pub fn new(x: usize, y: usize, ident: Ident) -> Self {
        Self {
            x,
            y,
            ident,
            asleep: false,
            peaceful: false,
            disguise: None,
        }
    }
}

/// Initial object placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub x: usize,
    pub y: usize,
    pub ident: Ident,
    pub quantity: u32,
    pub trapped: bool,
    pub locked: bool,
    pub buried: bool,
    /// Index of the containing object in the level's object list
    pub container: Option<usize>,
}

impl ObjectPlacement {
    pub fn new(x: usize, y: usize, ident: Ident) -> Self {
        Self {
            x,
            y,
            ident,
            quantity: 1,
            trapped: false,
            locked: false,
            buried: false,
            container: None,
        }
    }

    /// A pile of gold
    pub fn gold(x: usize, y: usize, amount: u32) -> Self {
        Self {
            quantity: amount,
            ..Self::new(x, y, Ident::named("gold piece"))
        }
    }
}

/// Trap on the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapPlacement {
    pub x: usize,
    pub y: usize,
    pub kind: TrapKind,
}

/// Stairway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stairway {
    pub x: usize,
    pub y: usize,
    pub destination: DLevel,
    pub up: bool,
    /// Connects to another branch rather than the next level of this one
    pub branch: bool,
}

/// Magic portal to another branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub x: usize,
    pub y: usize,
    pub destination: DLevel,
}

/// Complete level structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Level identifier
    pub dlevel: DLevel,

    /// Map cells, indexed `cells[x][y]`
    #[serde(default = "default_cells")]
    pub cells: Vec<Vec<Cell>>,

    /// Rooms; `Cell::room_number` is an index into this list plus one
    pub rooms: Vec<Room>,

    pub monsters: Vec<MonsterPlacement>,

    /// Objects; a contained object always follows its container
    pub objects: Vec<ObjectPlacement>,

    pub traps: Vec<TrapPlacement>,

    pub stairs: Vec<Stairway>,

    pub portals: Vec<Portal>,

    /// Level flags
    pub flags: LevelFlags,
}

impl Default for Level {
    fn default() -> Self {
        Self::new(DLevel::default())
    }
}

impl Level {
    /// Create a new level filled with stone
    pub fn new(dlevel: DLevel) -> Self {
        Self {
            dlevel,
            cells: default_cells(),
            rooms: Vec::new(),
            monsters: Vec::new(),
            objects: Vec::new(),
            traps: Vec::new(),
            stairs: Vec::new(),
            portals: Vec::new(),
            flags: LevelFlags::default(),
        }
    }

    /// Get cell at position
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[x][y]
    }

    /// Get mutable cell at position
    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.cells[x][y]
    }

    /// Check if position is valid
    pub const fn is_valid_pos(x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < COLNO && (y as usize) < ROWNO
    }

    /// Terrain type, with anything off the map reading as stone
    pub fn typ_at(&self, x: i32, y: i32) -> CellType {
        if Self::is_valid_pos(x, y) {
            self.cells[x as usize][y as usize].typ
        } else {
            CellType::Stone
        }
    }

    /// Fill the whole map with one terrain type
    pub fn fill(&mut self, typ: CellType) {
        for column in &mut self.cells {
            for cell in column.iter_mut() {
                *cell = Cell {
                    typ,
                    ..Cell::stone()
                };
            }
        }
    }

    /// Carve a room's floor and walls and register it. Returns its index.
    pub fn add_room(&mut self, room: Room) -> usize {
        let index = self.rooms.len();
        let number = (index + 1) as u8;
        let walls = room.bounds();
        for (x, y) in walls.points() {
            let cell = &mut self.cells[x][y];
            cell.lit = room.lit;
            cell.room_number = number;
            cell.typ = if room.contains(x, y) {
                CellType::Room
            } else if x == walls.lx && y == walls.ly {
                CellType::TLCorner
            } else if x == walls.hx && y == walls.ly {
                CellType::TRCorner
            } else if x == walls.lx && y == walls.hy {
                CellType::BLCorner
            } else if x == walls.hx && y == walls.hy {
                CellType::BRCorner
            } else if x == walls.lx || x == walls.hx {
                CellType::VWall
            } else {
                CellType::HWall
            };
        }
        self.rooms.push(room);
        index
    }

    /// Register a room over terrain that already exists, such as a mapped
    /// region. Only the room numbers and lighting of the interior change.
    pub fn register_room(&mut self, room: Room) -> usize {
        let index = self.rooms.len();
        let number = (index + 1) as u8;
        for (x, y) in room.interior().points() {
            let cell = &mut self.cells[x][y];
            cell.room_number = number;
            cell.lit = room.lit;
        }
        self.rooms.push(room);
        index
    }

    /// Index of the room whose interior or walls cover a position
    pub fn room_at(&self, x: usize, y: usize) -> Option<usize> {
        match self.cells[x][y].room_number {
            0 => None,
            n => Some(n as usize - 1),
        }
    }

    /// Turn a wall cell into a door of the given state
    pub fn set_door(&mut self, x: usize, y: usize, state: DoorState, secret: bool) {
        let cell = &mut self.cells[x][y];
        cell.typ = if secret {
            CellType::SecretDoor
        } else {
            CellType::Door
        };
        cell.set_door_state(state);
    }

    /// Check whether stairs, a portal or a trap already occupy a position
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.stairway_at(x, y).is_some()
            || self.portals.iter().any(|p| p.x == x && p.y == y)
            || self.trap_at(x, y).is_some()
    }

    /// Plain floor that nothing occupies yet
    pub fn is_free_floor(&self, x: usize, y: usize) -> bool {
        self.cells[x][y].typ == CellType::Room && !self.is_occupied(x, y)
    }

    /// Add a monster; returns its index
    pub fn add_monster(&mut self, monster: MonsterPlacement) -> usize {
        self.monsters.push(monster);
        self.monsters.len() - 1
    }

    /// Add an object; returns its index
    pub fn add_object(&mut self, object: ObjectPlacement) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Add a trap
    pub fn add_trap(&mut self, x: usize, y: usize, kind: TrapKind) {
        self.traps.push(TrapPlacement { x, y, kind });
    }

    /// Get trap at position
    pub fn trap_at(&self, x: usize, y: usize) -> Option<&TrapPlacement> {
        self.traps.iter().find(|t| t.x == x && t.y == y)
    }

    pub fn monster_at(&self, x: usize, y: usize) -> Option<&MonsterPlacement> {
        self.monsters.iter().find(|m| m.x == x && m.y == y)
    }

    /// Place a staircase, turning the cell into stairs
    pub fn add_stairs(&mut self, x: usize, y: usize, up: bool, destination: DLevel, branch: bool) {
        self.cells[x][y].typ = CellType::Stairs;
        self.stairs.push(Stairway {
            x,
            y,
            destination,
            up,
            branch,
        });
    }

    pub fn add_portal(&mut self, x: usize, y: usize, destination: DLevel) {
        self.portals.push(Portal { x, y, destination });
    }

    /// Find upstairs
    pub fn find_upstairs(&self) -> Option<(usize, usize)> {
        self.stairs.iter().find(|s| s.up).map(|s| (s.x, s.y))
    }

    /// Find downstairs
    pub fn find_downstairs(&self) -> Option<(usize, usize)> {
        self.stairs.iter().find(|s| !s.up).map(|s| (s.x, s.y))
    }

    /// Get stairway at position
    pub fn stairway_at(&self, x: usize, y: usize) -> Option<&Stairway> {
        self.stairs.iter().find(|s| s.x == x && s.y == y)
    }

    /// Number of cells a hero could stand on
    pub fn floor_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.typ.is_passable())
            .count()
    }

    /// Map character for one position
    pub fn glyph_at(&self, x: usize, y: usize) -> char {
        if let Some(stairs) = self.stairway_at(x, y) {
            return if stairs.up { '<' } else { '>' };
        }
        if self.portals.iter().any(|p| p.x == x && p.y == y) {
            return '^';
        }
        let cell = &self.cells[x][y];
        match cell.typ {
            CellType::Door => {
                let state = cell.door_state();
                if state.intersects(DoorState::CLOSED | DoorState::LOCKED) {
                    '+'
                } else if state.contains(DoorState::OPEN) {
                    '\''
                } else {
                    '.'
                }
            }
            CellType::SecretDoor => '+',
            typ => typ.symbol(),
        }
    }

    /// ASCII picture of the terrain, one line per row, trailing blanks trimmed
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((COLNO + 1) * ROWNO);
        for y in 0..ROWNO {
            let line: String = (0..COLNO).map(|x| self.glyph_at(x, y)).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}
