//! Level script description
//!
//! A script is an identifier plus an ordered list of [`Op`]s. Ops that
//! resolve a position may carry children; the interpreter runs them right
//! after the parent, depth first. Coordinates inside ops are relative to the
//! current frame: the whole map until a `Map` op sets one, then the map
//! area, a region, a room interior or a single `ForEach` coordinate.

use serde::{Deserialize, Serialize};

use crate::tables::Ident;

use super::{Alignment, CellType, Disguise, DoorState, LevelFlag, RoomKind, TrapKind};

/// How a level starts out before the script's own ops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitStyle {
    /// Every cell set to one terrain type
    Solid(CellType),
    /// A complete run of the room-and-corridor builder
    Generic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Where a map is put on the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapAlign {
    /// Top-left corner at an absolute coordinate
    At(i32, i32),
    /// Aligned against the level edges or centred
    Edge(HAlign, VAlign),
}

impl Default for MapAlign {
    fn default() -> Self {
        MapAlign::Edge(HAlign::Center, VAlign::Center)
    }
}

/// ASCII terrain map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    pub rows: Vec<String>,
    pub align: MapAlign,
}

impl MapSpec {
    /// Build from a block of text; leading and trailing blank lines dropped
    pub fn parse(text: &str, align: MapAlign) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(0);
        let end = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(start, |i| i + 1);
        Self {
            rows: lines[start..end.max(start)]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            align,
        }
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Selection expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelExpr {
    Rect(i32, i32, i32, i32),
    Outline(i32, i32, i32, i32),
    Line(i32, i32, i32, i32),
    /// Cells of the frame with this terrain
    Match(CellType),
    /// Cells 4-connected to a start coordinate sharing its terrain
    Flood(i32, i32),
    /// A selection bound earlier with `Select`
    Var(String),
    Union(Box<SelExpr>, Box<SelExpr>),
    Intersect(Box<SelExpr>, Box<SelExpr>),
    Difference(Box<SelExpr>, Box<SelExpr>),
    Negate(Box<SelExpr>),
    Grow(Box<SelExpr>),
    /// Tight bounding rectangle of an expression
    Bounds(Box<SelExpr>),
    /// The area covered by the last map
    MapArea,
}

impl SelExpr {
    pub fn var(name: &str) -> Self {
        SelExpr::Var(name.to_string())
    }

    pub fn union(self, other: SelExpr) -> Self {
        SelExpr::Union(Box::new(self), Box::new(other))
    }

    pub fn intersect(self, other: SelExpr) -> Self {
        SelExpr::Intersect(Box::new(self), Box::new(other))
    }

    pub fn difference(self, other: SelExpr) -> Self {
        SelExpr::Difference(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        SelExpr::Negate(Box::new(self))
    }

    pub fn grow(self) -> Self {
        SelExpr::Grow(Box::new(self))
    }

    pub fn bounds(self) -> Self {
        SelExpr::Bounds(Box::new(self))
    }
}

/// Where a placement goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loc {
    /// Fixed coordinate relative to the frame
    At(i32, i32),
    /// Any suitable cell of the frame, one draw
    Random,
    /// Any cell of a selection, one draw
    In(SelExpr),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpec {
    /// Fixed identity; drawn from the content tables when absent
    pub ident: Option<Ident>,
    /// Class restriction for a drawn identity
    pub class: Option<char>,
    pub asleep: bool,
    pub peaceful: bool,
    /// What the monster shows itself as until disturbed
    pub appear_as: Option<Disguise>,
}

impl MonsterSpec {
    pub fn named(name: &str) -> Self {
        Self {
            ident: Some(Ident::named(name)),
            ..Self::default()
        }
    }

    pub fn of_class(class: char) -> Self {
        Self {
            class: Some(class),
            ..Self::default()
        }
    }

    pub fn appearing_as(self, disguise: Disguise) -> Self {
        Self {
            appear_as: Some(disguise),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub ident: Option<Ident>,
    pub class: Option<char>,
    pub quantity: u32,
    pub trapped: bool,
    pub locked: bool,
    pub buried: bool,
}

impl Default for ObjectSpec {
    fn default() -> Self {
        Self {
            ident: None,
            class: None,
            quantity: 1,
            trapped: false,
            locked: false,
            buried: false,
        }
    }
}

impl ObjectSpec {
    pub fn named(name: &str) -> Self {
        Self {
            ident: Some(Ident::named(name)),
            ..Self::default()
        }
    }

    pub fn of_class(class: char) -> Self {
        Self {
            class: Some(class),
            ..Self::default()
        }
    }
}

/// Room carved by a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Interior top-left relative to the frame; random attempts when absent
    pub pos: Option<(i32, i32)>,
    /// Interior size; drawn like a generic room when absent
    pub size: Option<(usize, usize)>,
    pub kind: RoomKind,
    pub lit: bool,
}

impl Default for RoomSpec {
    fn default() -> Self {
        Self {
            pos: None,
            size: None,
            kind: RoomKind::Ordinary,
            lit: true,
        }
    }
}

/// One builder call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Init(InitStyle),
    Flags(Vec<LevelFlag>),
    Map(MapSpec),
    Terrain {
        sel: SelExpr,
        typ: CellType,
    },
    /// Bind a named selection for later ops
    Select {
        name: String,
        sel: SelExpr,
    },
    NonDiggable(SelExpr),
    NonPassable(SelExpr),
    Region {
        area: SelExpr,
        lit: Option<bool>,
        kind: Option<RoomKind>,
        contents: Vec<Op>,
    },
    Room {
        spec: RoomSpec,
        contents: Vec<Op>,
    },
    /// Join the rooms carved so far with the generic corridor algorithm
    Corridors,
    Monster {
        loc: Loc,
        spec: MonsterSpec,
    },
    /// Objects inside `contents` end up in this object
    Object {
        loc: Loc,
        spec: ObjectSpec,
        contents: Vec<Op>,
    },
    Trap {
        loc: Loc,
        kind: Option<TrapKind>,
    },
    Door {
        loc: Loc,
        state: Option<DoorState>,
        secret: bool,
    },
    Altar {
        loc: Loc,
        align: Option<Alignment>,
    },
    Fountain(Loc),
    Stair {
        loc: Loc,
        up: bool,
    },
    /// The level's branch connection, if the topology gives it one
    Portal(Loc),
    ForEach {
        sel: SelExpr,
        contents: Vec<Op>,
    },
    Wallify,
}

/// A named level script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub ops: Vec<Op>,
}

impl Script {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ops: Vec::new(),
        }
    }

    pub fn op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    pub fn init(self, style: InitStyle) -> Self {
        self.op(Op::Init(style))
    }

    pub fn flags(self, flags: &[LevelFlag]) -> Self {
        self.op(Op::Flags(flags.to_vec()))
    }

    pub fn map(self, text: &str, align: MapAlign) -> Self {
        self.op(Op::Map(MapSpec::parse(text, align)))
    }

    pub fn terrain(self, sel: SelExpr, typ: CellType) -> Self {
        self.op(Op::Terrain { sel, typ })
    }

    pub fn select(self, name: &str, sel: SelExpr) -> Self {
        self.op(Op::Select {
            name: name.to_string(),
            sel,
        })
    }

    pub fn non_diggable(self, sel: SelExpr) -> Self {
        self.op(Op::NonDiggable(sel))
    }

    pub fn non_passable(self, sel: SelExpr) -> Self {
        self.op(Op::NonPassable(sel))
    }

    pub fn monster(self, loc: Loc, spec: MonsterSpec) -> Self {
        self.op(Op::Monster { loc, spec })
    }

    pub fn object(self, loc: Loc, spec: ObjectSpec) -> Self {
        self.op(Op::Object {
            loc,
            spec,
            contents: Vec::new(),
        })
    }

    /// A container and the ops that fill it
    pub fn container(self, loc: Loc, spec: ObjectSpec, contents: Vec<Op>) -> Self {
        self.op(Op::Object {
            loc,
            spec,
            contents,
        })
    }

    pub fn trap(self, loc: Loc, kind: Option<TrapKind>) -> Self {
        self.op(Op::Trap { loc, kind })
    }

    pub fn door(self, loc: Loc, state: Option<DoorState>) -> Self {
        self.op(Op::Door {
            loc,
            state,
            secret: false,
        })
    }

    pub fn altar(self, loc: Loc, align: Option<Alignment>) -> Self {
        self.op(Op::Altar { loc, align })
    }

    pub fn fountain(self, loc: Loc) -> Self {
        self.op(Op::Fountain(loc))
    }

    pub fn stair(self, loc: Loc, up: bool) -> Self {
        self.op(Op::Stair { loc, up })
    }

    pub fn portal(self, loc: Loc) -> Self {
        self.op(Op::Portal(loc))
    }

    pub fn region(self, area: SelExpr, lit: Option<bool>, kind: Option<RoomKind>) -> Self {
        self.op(Op::Region {
            area,
            lit,
            kind,
            contents: Vec::new(),
        })
    }

    pub fn room(self, spec: RoomSpec, contents: Vec<Op>) -> Self {
        self.op(Op::Room { spec, contents })
    }

    pub fn corridors(self) -> Self {
        self.op(Op::Corridors)
    }

    pub fn for_each(self, sel: SelExpr, contents: Vec<Op>) -> Self {
        self.op(Op::ForEach { sel, contents })
    }

    pub fn wallify(self) -> Self {
        self.op(Op::Wallify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_parse_trims_blank_lines() {
        let map = MapSpec::parse(
            "
---
|.|
---
",
            MapAlign::default(),
        );
        assert_eq!(map.height(), 3);
        assert_eq!(map.width(), 3);
        assert_eq!(map.rows[1], "|.|");
    }

    #[test]
    fn test_ragged_map_width() {
        let map = MapSpec::parse("..\n....\n.", MapAlign::At(1, 1));
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
    }

    #[test]
    fn test_builder_keeps_order() {
        let script = Script::new("demo")
            .init(InitStyle::Solid(CellType::Stone))
            .fountain(Loc::At(1, 1))
            .wallify();
        assert_eq!(script.ops.len(), 3);
        assert_eq!(script.ops[2], Op::Wallify);
    }

    #[test]
    fn test_script_serializes() {
        let script = Script::new("demo").container(
            Loc::Random,
            ObjectSpec::named("chest"),
            vec![Op::Object {
                loc: Loc::Random,
                spec: ObjectSpec::named("luckstone"),
                contents: Vec::new(),
            }],
        );
        let json = serde_json::to_string(&script).unwrap();
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
