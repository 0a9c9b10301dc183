//! Special room typing and room contents
//!
//! One special room kind is chosen per level through a depth-gated chain
//! of draws. After stairs are placed, special rooms are filled and then
//! ordinary rooms receive their random stock.

use log::debug;

use crate::tables::Ident;

use super::corridor::joinable_rooms;
use super::generation::GenContext;
use super::selection::Selection;
use super::{
    Alignment, CellType, Level, LevelFlags, MonsterPlacement, ObjectPlacement, RoomKind, TrapKind,
};

/// Decide whether this level gets a special room (mkroom chain)
///
/// Each test short-circuits: a gate that fails on depth costs no draw, and
/// the first successful draw ends the chain.
pub fn select_special_kind(ctx: &mut GenContext<'_>, depth: i8, nroom: usize) -> Option<RoomKind> {
    let rng = &mut *ctx.rng;
    let d = depth as i32;
    if d > 1 && nroom >= 3 && rng.rn2(d as u32) < 3 {
        return Some(RoomKind::Shop);
    }
    let chain: [(i32, u32, RoomKind); 7] = [
        (4, 6, RoomKind::Throne),
        (6, 7, RoomKind::Zoo),
        (8, 5, RoomKind::Temple),
        (9, 5, RoomKind::Beehive),
        (11, 6, RoomKind::Morgue),
        (14, 4, RoomKind::Barracks),
        (15, 6, RoomKind::Swamp),
    ];
    chain
        .into_iter()
        .find(|&(min_depth, chance, _)| d >= min_depth && rng.one_in(chance))
        .map(|(_, _, kind)| kind)
}

/// Pick a room suitable for the given special kind
///
/// The last ordinary room big enough wins; room 0 only when it is the only
/// room.
pub fn pick_room_for_special(level: &Level, nroom: usize, kind: RoomKind) -> Option<usize> {
    level.rooms[..nroom]
        .iter()
        .enumerate()
        .rev()
        .find(|(idx, room)| {
            room.kind == RoomKind::Ordinary
                && room.area() >= kind.min_area()
                && (*idx > 0 || nroom == 1)
        })
        .map(|(idx, _)| idx)
}

/// Update level flags based on room kind
pub fn set_level_flags_for_room(flags: &mut LevelFlags, kind: RoomKind) {
    match kind {
        RoomKind::Throne => flags.has_court = true,
        RoomKind::Swamp => flags.has_swamp = true,
        RoomKind::Vault => flags.has_vault = true,
        RoomKind::Beehive => flags.has_beehive = true,
        RoomKind::Morgue => flags.has_morgue = true,
        RoomKind::Barracks => flags.has_barracks = true,
        RoomKind::Zoo => flags.has_zoo = true,
        RoomKind::Temple => flags.has_temple = true,
        RoomKind::Shop => flags.has_shop = true,
        RoomKind::Ordinary | RoomKind::Arrival => {}
    }
}

/// Run the typing chain and mark the chosen room
pub fn assign_special_room(level: &mut Level, ctx: &mut GenContext<'_>) {
    let nroom = joinable_rooms(level);
    let Some(kind) = select_special_kind(ctx, level.dlevel.depth, nroom) else {
        return;
    };
    match pick_room_for_special(level, nroom, kind) {
        Some(idx) => {
            debug!("{}: room {idx} becomes a {kind}", level.dlevel);
            level.rooms[idx].set_kind(kind);
            set_level_flags_for_room(&mut level.flags, kind);
        }
        None => debug!("{}: no room can hold a {kind}", level.dlevel),
    }
}

/// Select monster for throne room (courtmon)
pub fn court_monster(ctx: &mut GenContext<'_>, difficulty: i32) -> Ident {
    let i = ctx.rng.rnd(60) as i32 + ctx.rng.rnd((3 * difficulty).max(1) as u32) as i32;
    let class = match i {
        i if i > 100 => 'D',
        i if i > 95 => 'H',
        i if i > 85 => 'T',
        i if i > 75 => 'C',
        i if i > 60 => 'o',
        i if i > 45 => 'h',
        i if i > 30 => 'o',
        i if i > 15 => 'G',
        _ => 'k',
    };
    Ident::Class(class)
}

/// Select monster for morgue (morguemon)
pub fn morgue_monster(ctx: &mut GenContext<'_>, difficulty: i32) -> Ident {
    let i = ctx.rng.rn2(100);
    let hd = ctx.rng.rn2(difficulty.max(1) as u32);

    if hd > 10 && i < 10 {
        return Ident::Class('&');
    }
    if hd > 8 && i > 85 {
        return Ident::Class('V');
    }
    match i {
        0..=19 => Ident::named("ghost"),
        20..=39 => Ident::Class('W'),
        _ => Ident::Class('Z'),
    }
}

/// Select monster for barracks (squadmon)
pub fn squad_monster(ctx: &mut GenContext<'_>, difficulty: i32) -> Ident {
    let prob = ctx.rng.rnd(80 + difficulty.max(0) as u32);
    let name = match prob {
        p if p >= 100 => "captain",
        p if p >= 96 => "lieutenant",
        p if p >= 81 => "sergeant",
        _ => "soldier",
    };
    Ident::named(name)
}

/// Select monster for swamp (swampmon)
pub fn swamp_monster(ctx: &mut GenContext<'_>) -> Ident {
    let name = match ctx.rng.rn2(10) {
        0..=7 => "giant eel",
        8 => "piranha",
        _ => "electric eel",
    };
    Ident::named(name)
}

fn sleeper(x: usize, y: usize, ident: Ident) -> MonsterPlacement {
    MonsterPlacement {
        asleep: true,
        ..MonsterPlacement::new(x, y, ident)
    }
}

fn peaceful(x: usize, y: usize, ident: Ident) -> MonsterPlacement {
    MonsterPlacement {
        peaceful: true,
        ..MonsterPlacement::new(x, y, ident)
    }
}

/// Interior cells of a room that can still take a monster, row-major
fn open_cells(level: &Level, room: usize) -> Vec<(usize, usize)> {
    let sel = Selection::from_rect(&level.rooms[room].interior());
    sel.filter(|x, y| level.is_free_floor(x, y) && level.monster_at(x, y).is_none())
        .iter()
        .collect()
}

/// Generate the contents of a special room
pub fn fill_special_room(level: &mut Level, ctx: &mut GenContext<'_>, room: usize) {
    let depth = level.dlevel.depth.max(1) as i32;
    let kind = level.rooms[room].kind;
    let center = level.rooms[room].center();
    debug!("{}: filling {kind} room {room}", level.dlevel);

    match kind {
        RoomKind::Vault => {
            for (x, y) in open_cells(level, room) {
                let amount = ctx.rng.rn1((depth * 100) as u32, 51);
                level.add_object(ObjectPlacement::gold(x, y, amount));
            }
        }
        RoomKind::Zoo => {
            for (x, y) in open_cells(level, room) {
                let ident = ctx.tables.random_monster(ctx.rng, depth as i8, None);
                level.add_monster(sleeper(x, y, ident));
                let amount = ctx.rng.rn1((depth * 10) as u32, 10);
                level.add_object(ObjectPlacement::gold(x, y, amount));
            }
        }
        RoomKind::Throne => {
            let (tx, ty) = level.rooms[room].random_point(ctx.rng);
            if level.is_free_floor(tx, ty) {
                level.cells[tx][ty].typ = CellType::Throne;
                level.add_monster(sleeper(tx, ty, Ident::named("throne ruler")));
            }
            for (x, y) in open_cells(level, room) {
                let ident = court_monster(ctx, depth);
                level.add_monster(sleeper(x, y, ident));
            }
        }
        RoomKind::Morgue => {
            for (x, y) in open_cells(level, room) {
                let ident = morgue_monster(ctx, depth);
                level.add_monster(sleeper(x, y, ident));
                if ctx.rng.one_in(5) {
                    level.add_object(ObjectPlacement::new(x, y, Ident::named("corpse")));
                }
            }
        }
        RoomKind::Barracks => {
            for (x, y) in open_cells(level, room) {
                let ident = squad_monster(ctx, depth);
                level.add_monster(sleeper(x, y, ident));
                if ctx.rng.one_in(20) {
                    level.add_object(ObjectPlacement::new(x, y, Ident::named("chest")));
                }
            }
        }
        RoomKind::Beehive => {
            for (x, y) in open_cells(level, room) {
                let name = if (x, y) == center {
                    "queen bee"
                } else {
                    "killer bee"
                };
                level.add_monster(sleeper(x, y, Ident::named(name)));
                if ctx.rng.one_in(3) {
                    level.add_object(ObjectPlacement::new(
                        x,
                        y,
                        Ident::named("lump of royal jelly"),
                    ));
                }
            }
        }
        RoomKind::Temple => {
            let (cx, cy) = center;
            let alignment = Alignment::random(ctx.rng);
            if level.is_free_floor(cx, cy) {
                level.cells[cx][cy].make_altar(alignment);
            }
            let r = &level.rooms[room];
            let around = [
                (cx + 1, cy),
                (cx.wrapping_sub(1), cy),
                (cx, cy + 1),
                (cx, cy.wrapping_sub(1)),
            ];
            let spot = around
                .into_iter()
                .find(|&(x, y)| r.contains(x, y) && level.is_free_floor(x, y));
            if let Some((px, py)) = spot {
                level.add_monster(peaceful(px, py, Ident::named("aligned priest")));
            }
        }
        RoomKind::Shop => {
            let r = level.rooms[room].clone();
            let door = r
                .bounds()
                .points()
                .find(|&(x, y)| level.cells[x][y].typ == CellType::Door);
            let mut keeper = None;
            if let Some((dx, dy)) = door {
                let inside = (dx.clamp(r.lx, r.hx), dy.clamp(r.ly, r.hy));
                if level.is_free_floor(inside.0, inside.1) {
                    level.add_monster(peaceful(inside.0, inside.1, Ident::named("shopkeeper")));
                    keeper = Some(inside);
                }
            }
            for (x, y) in open_cells(level, room) {
                if keeper == Some((x, y)) {
                    continue;
                }
                let ident = ctx.tables.random_object(ctx.rng, None);
                level.add_object(ObjectPlacement::new(x, y, ident));
            }
        }
        RoomKind::Swamp => {
            for (x, y) in open_cells(level, room) {
                if (x + y) % 2 == 0 {
                    level.cells[x][y].typ = CellType::Pool;
                    if ctx.rng.one_in(2) {
                        let ident = swamp_monster(ctx);
                        level.add_monster(sleeper(x, y, ident));
                    }
                } else if ctx.rng.one_in(4) {
                    level.add_monster(sleeper(x, y, Ident::Class('F')));
                }
            }
        }
        RoomKind::Ordinary | RoomKind::Arrival => {}
    }
    level.rooms[room].needs_fill = false;
}

/// Random stock for an ordinary room
pub fn stock_room(level: &mut Level, ctx: &mut GenContext<'_>, room: usize) {
    let depth = level.dlevel.depth.max(1);
    let d = depth as u32;
    let kind = level.rooms[room].kind;

    if kind != RoomKind::Arrival && ctx.rng.one_in(3) {
        let (x, y) = level.rooms[room].random_point(ctx.rng);
        let ident = ctx.tables.random_monster(ctx.rng, depth, None);
        if level.monster_at(x, y).is_none() {
            level.add_monster(MonsterPlacement::new(x, y, ident));
        }
    }

    let trap_chance = 8u32.saturating_sub(d / 6).max(2);
    let mut traps = 0;
    while traps < 4 && ctx.rng.one_in(trap_chance) {
        traps += 1;
        let trap = TrapKind::random(ctx.rng, depth);
        let (x, y) = level.rooms[room].random_point(ctx.rng);
        if level.is_free_floor(x, y) {
            level.add_trap(x, y, trap);
        }
    }

    let gold_chance = 10u32.saturating_sub(d / 3).max(2);
    if ctx.rng.one_in(gold_chance) {
        let (x, y) = level.rooms[room].random_point(ctx.rng);
        let amount = 1 + ctx.rng.rnd(d + 2) * ctx.rng.rnd(30);
        level.add_object(ObjectPlacement::gold(x, y, amount));
    }

    if ctx.rng.one_in(10) {
        let (x, y) = level.rooms[room].random_point(ctx.rng);
        if level.is_free_floor(x, y) {
            level.cells[x][y].typ = CellType::Fountain;
        }
    }

    if ctx.rng.one_in(60) {
        let (x, y) = level.rooms[room].random_point(ctx.rng);
        if level.is_free_floor(x, y) {
            level.cells[x][y].typ = CellType::Sink;
        }
    }

    if ctx.rng.one_in(3) {
        let mut objects = 1;
        loop {
            let (x, y) = level.rooms[room].random_point(ctx.rng);
            let ident = ctx.tables.random_object(ctx.rng, None);
            level.add_object(ObjectPlacement::new(x, y, ident));
            if objects > 4 || !ctx.rng.one_in(5) {
                break;
            }
            objects += 1;
        }
    }
}

/// Fill special rooms, then stock ordinary ones
pub fn fill_rooms(level: &mut Level, ctx: &mut GenContext<'_>) {
    for room in 0..level.rooms.len() {
        if level.rooms[room].needs_fill {
            fill_special_room(level, ctx, room);
        }
    }
    for room in 0..level.rooms.len() {
        if matches!(level.rooms[room].kind, RoomKind::Ordinary | RoomKind::Arrival) {
            stock_room(level, ctx, room);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{BranchId, DLevel, Room};
    use crate::options::GenOptions;
    use crate::rng::GameRng;
    use crate::tables::UniformTables;

    fn with_ctx<R>(seed: u64, f: impl FnOnce(&mut GenContext<'_>) -> R) -> R {
        let options = GenOptions::default();
        let tables = UniformTables::default();
        let mut rng = GameRng::new(seed);
        let mut ctx = GenContext {
            rng: &mut rng,
            options: &options,
            tables: &tables,
        };
        f(&mut ctx)
    }

    #[test]
    fn test_no_special_rooms_on_first_level() {
        with_ctx(1, |ctx| {
            assert_eq!(select_special_kind(ctx, 1, 8), None);
            assert_eq!(ctx.rng.call_count(), 0);
        });
    }

    #[test]
    fn test_shop_needs_three_rooms() {
        with_ctx(1, |ctx| {
            // depth 2: rn2(2) < 3 always holds
            assert_eq!(select_special_kind(ctx, 2, 3), Some(RoomKind::Shop));
            assert_eq!(select_special_kind(ctx, 2, 2), None);
        });
    }

    #[test]
    fn test_pick_room_skips_first_and_small() {
        let mut level = Level::default();
        level.add_room(Room::new(5, 5, 10, 8));
        level.add_room(Room::new(20, 5, 24, 8));
        level.add_room(Room::new(40, 5, 41, 6));
        assert_eq!(pick_room_for_special(&level, 3, RoomKind::Zoo), Some(1));
        let mut single = Level::default();
        single.add_room(Room::new(5, 5, 10, 8));
        assert_eq!(pick_room_for_special(&single, 1, RoomKind::Shop), Some(0));
        let mut small = Level::default();
        small.add_room(Room::new(5, 5, 10, 8));
        small.add_room(Room::new(20, 5, 22, 7));
        assert_eq!(pick_room_for_special(&small, 2, RoomKind::Shop), None);
        assert_eq!(pick_room_for_special(&small, 2, RoomKind::Zoo), Some(1));
    }

    #[test]
    fn test_zoo_fills_every_free_cell() {
        with_ctx(9, |ctx| {
            let mut level = Level::new(DLevel::new(BranchId::Main, 8));
            level.add_room(Room::new(10, 5, 13, 7));
            level.rooms[0].set_kind(RoomKind::Zoo);
            level.add_stairs(10, 5, false, DLevel::new(BranchId::Main, 9), false);
            fill_special_room(&mut level, ctx, 0);
            assert_eq!(level.monsters.len(), 11);
            assert!(level.monsters.iter().all(|m| m.asleep));
            assert_eq!(level.objects.len(), 11);
            assert!(level.monster_at(10, 5).is_none());
            assert!(!level.rooms[0].needs_fill);
        });
    }

    #[test]
    fn test_temple_gets_altar_and_priest() {
        with_ctx(4, |ctx| {
            let mut level = Level::new(DLevel::new(BranchId::Main, 10));
            level.add_room(Room::new(10, 5, 14, 9));
            level.rooms[0].set_kind(RoomKind::Temple);
            fill_special_room(&mut level, ctx, 0);
            assert!(level.cell(12, 7).altar_alignment().is_some());
            assert_eq!(level.monsters.len(), 1);
            assert!(level.monsters[0].peaceful);
            assert_eq!(ctx.rng.call_count(), 1);
        });
    }

    #[test]
    fn test_arrival_rooms_get_no_monsters() {
        for seed in 0..40 {
            with_ctx(seed, |ctx| {
                let mut level = Level::new(DLevel::new(BranchId::Main, 2));
                level.add_room(Room::new(10, 5, 14, 9));
                level.rooms[0].set_kind(RoomKind::Arrival);
                stock_room(&mut level, ctx, 0);
                assert!(level.monsters.is_empty());
            });
        }
    }
}
