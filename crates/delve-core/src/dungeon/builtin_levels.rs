//! Built-in level scripts
//!
//! A handful of hand-authored levels used by the command line tool and the
//! tests. Their layouts are data; everything they do goes through the
//! ordinary script ops.

use crate::error::Result;
use crate::tables::Ident;

use super::des::{
    HAlign, InitStyle, Loc, MapAlign, MonsterSpec, ObjectSpec, Op, RoomSpec, Script, SelExpr,
    VAlign,
};
use super::registry::{Registry, Variant};
use super::{BranchId, CellType, DLevel, LevelFlag, RoomKind};

const BIGROOM_PILLARS: &str = "
---------------------------------------------------------------------
|...................................................................|
|...|.......|.......|.......|.......|.......|.......|.......|.......|
|...................................................................|
|.......|.......|.......|.......|.......|.......|.......|.......|...|
|...................................................................|
|...|.......|.......|.......|.......|.......|.......|.......|.......|
|...................................................................|
|.......|.......|.......|.......|.......|.......|.......|.......|...|
|...................................................................|
---------------------------------------------------------------------
";

const MINETOWN: &str = "
-----------------------------------
|.................................|
|.-----......{.........-------....|
|.|...|................|.....|....|
|.|...+................+.....|....|
|.|...|................|.....|....|
|.-----................-------....|
|.................................|
-----------------------------------
";

const MINES_END: &str = "
---------          ---------
|.......|          |.......|
|.......------------.......|
|..........................|
|.......------------.......|
|.......|          |.......|
---------          ---------
";

fn monster(loc: Loc, spec: MonsterSpec) -> Op {
    Op::Monster { loc, spec }
}

fn object(loc: Loc, spec: ObjectSpec) -> Op {
    Op::Object {
        loc,
        spec,
        contents: Vec::new(),
    }
}

/// The Oracle's centre room with its fountains, plus random rooms
pub fn oracle() -> Script {
    let delphi = RoomSpec {
        pos: Some((34, 6)),
        size: Some((11, 9)),
        kind: RoomKind::Ordinary,
        lit: true,
    };
    let centaur = MonsterSpec {
        peaceful: true,
        ..MonsterSpec::of_class('C')
    };
    Script::new("oracle")
        .init(InitStyle::Solid(CellType::Stone))
        .room(
            delphi,
            vec![
                Op::Fountain(Loc::At(5, 1)),
                Op::Fountain(Loc::At(5, 7)),
                Op::Fountain(Loc::At(1, 4)),
                Op::Fountain(Loc::At(9, 4)),
                monster(
                    Loc::At(5, 4),
                    MonsterSpec {
                        peaceful: true,
                        ..MonsterSpec::named("Oracle")
                    },
                ),
                monster(Loc::Random, centaur.clone()),
                monster(Loc::Random, centaur),
            ],
        )
        .room(
            RoomSpec::default(),
            vec![
                Op::Stair {
                    loc: Loc::Random,
                    up: true,
                },
                object(Loc::Random, ObjectSpec::default()),
            ],
        )
        .room(
            RoomSpec::default(),
            vec![
                Op::Stair {
                    loc: Loc::Random,
                    up: false,
                },
                Op::Trap {
                    loc: Loc::Random,
                    kind: None,
                },
            ],
        )
        .room(
            RoomSpec::default(),
            vec![
                monster(Loc::Random, MonsterSpec::default()),
                object(Loc::Random, ObjectSpec::default()),
            ],
        )
        .corridors()
}

/// One huge lit room
pub fn bigroom_open() -> Script {
    let mut contents: Vec<Op> = Vec::new();
    for _ in 0..8 {
        contents.push(monster(Loc::Random, MonsterSpec::default()));
        contents.push(object(Loc::Random, ObjectSpec::default()));
    }
    contents.push(Op::Stair {
        loc: Loc::Random,
        up: true,
    });
    contents.push(Op::Stair {
        loc: Loc::Random,
        up: false,
    });
    Script::new("bigrm-1")
        .init(InitStyle::Solid(CellType::Stone))
        .room(
            RoomSpec {
                pos: Some((3, 3)),
                size: Some((73, 14)),
                kind: RoomKind::Ordinary,
                lit: true,
            },
            contents,
        )
}

/// The big room with rows of pillars; stairs come from finalisation
pub fn bigroom_pillars() -> Script {
    let floor = SelExpr::Match(CellType::Room);
    Script::new("bigrm-2")
        .init(InitStyle::Solid(CellType::Stone))
        .map(BIGROOM_PILLARS, MapAlign::Edge(HAlign::Center, VAlign::Center))
        .region(SelExpr::MapArea, Some(true), None)
        .select("floor", floor)
        .for_each(
            SelExpr::Line(4, 1, 64, 9).intersect(SelExpr::var("floor")),
            vec![monster(Loc::At(0, 0), MonsterSpec::default())],
        )
        .object(Loc::In(SelExpr::var("floor")), ObjectSpec::of_class('*'))
        .non_diggable(SelExpr::MapArea)
}

/// A small town with a shop, a temple and a fountain
pub fn minetown() -> Script {
    Script::new("minetown")
        .init(InitStyle::Solid(CellType::Stone))
        .map(MINETOWN, MapAlign::Edge(HAlign::Center, VAlign::Center))
        .region(SelExpr::MapArea, Some(true), None)
        .region(SelExpr::Rect(3, 3, 5, 5), Some(true), Some(RoomKind::Shop))
        .region(SelExpr::Rect(24, 3, 28, 5), Some(true), Some(RoomKind::Temple))
        .monster(
            Loc::In(SelExpr::Rect(8, 1, 20, 7)),
            MonsterSpec {
                peaceful: true,
                ..MonsterSpec::named("watchman")
            },
        )
        .monster(Loc::Random, MonsterSpec::of_class('G'))
        .monster(Loc::Random, MonsterSpec::of_class('G'))
}

/// Two chambers; the left one hides a chest with a luckstone
pub fn mines_end() -> Script {
    let treasure = vec![
        object(Loc::Random, ObjectSpec::named("luckstone")),
        object(Loc::Random, ObjectSpec::of_class('*')),
        object(Loc::Random, ObjectSpec::of_class('*')),
    ];
    Script::new("minend-1")
        .init(InitStyle::Solid(CellType::Stone))
        .map(MINES_END, MapAlign::Edge(HAlign::Center, VAlign::Center))
        .flags(&[LevelFlag::Mazelike])
        .select("treasury", SelExpr::Rect(1, 1, 7, 5))
        .container(
            Loc::In(SelExpr::var("treasury")),
            ObjectSpec {
                locked: true,
                ..ObjectSpec::named("chest")
            },
            treasure,
        )
        .monster(
            Loc::In(SelExpr::var("treasury").negate().intersect(SelExpr::Match(CellType::Room))),
            MonsterSpec {
                ident: Some(Ident::Class('G')),
                asleep: true,
                ..MonsterSpec::default()
            },
        )
}

/// Every built-in script with the coordinate it belongs to
pub fn builtin_scripts() -> Vec<(DLevel, Vec<Variant>)> {
    vec![
        (
            DLevel::new(BranchId::Main, 5),
            vec![Variant::new(oracle())],
        ),
        (
            DLevel::new(BranchId::Main, 12),
            vec![
                Variant::weighted(bigroom_open(), 2),
                Variant::new(bigroom_pillars()),
            ],
        ),
        (
            DLevel::new(BranchId::Mines, 3),
            vec![Variant::new(minetown())],
        ),
        (
            DLevel::new(BranchId::Mines, 8),
            vec![Variant::new(mines_end())],
        ),
    ]
}

/// Register the built-in scripts
pub fn register_builtin(registry: &mut Registry) -> Result<()> {
    for (dlevel, variants) in builtin_scripts() {
        registry.register(dlevel, variants)?;
    }
    Ok(())
}
