//! Level generation
//!
//! The generic builder: rooms, vault, room typing, corridors, walls,
//! stairs and contents, in that order. Every room attempt costs exactly
//! four draws whether or not the room fits.

use log::{debug, warn};

use crate::consts::{MAXNROFROOMS, XLIM, YLIM};
use crate::error::{GenError, Result};
use crate::options::GenOptions;
use crate::rng::GameRng;
use crate::tables::ContentTables;
use crate::{COLNO, ROWNO};

use super::corridor::make_corridors;
use super::special_rooms::{assign_special_room, fill_rooms};
use super::stairs::place_stairs;
use super::wallify::wallify;
use super::{Level, Room, RoomKind, StairPlan};

/// Everything a builder draws on besides the level itself
pub struct GenContext<'a> {
    pub rng: &'a mut GameRng,
    pub options: &'a GenOptions,
    pub tables: &'a dyn ContentTables,
}

/// Interior of the room carved when nothing else fits
pub const EMERGENCY_ROOM: (usize, usize, usize, usize) = (36, 8, 43, 12);

/// Generate a standard level with rooms and corridors
pub fn generate_level(level: &mut Level, ctx: &mut GenContext<'_>, plan: &StairPlan) -> Result<()> {
    make_rooms(level, ctx);
    assign_special_room(level, ctx);
    make_corridors(level, ctx);
    wallify(level);
    place_stairs(level, ctx, plan)?;
    fill_rooms(level, ctx);

    if level.floor_count() == 0 {
        return Err(GenError::NoFloor(level.dlevel));
    }
    Ok(())
}

/// Check a candidate interior against the map margins and existing rooms
pub(crate) fn room_fits(
    rooms: &[Room],
    lx: usize,
    ly: usize,
    hx: usize,
    hy: usize,
    gap: usize,
) -> bool {
    if hx > COLNO - XLIM - 1 || hy > ROWNO - YLIM - 2 {
        return false;
    }
    !rooms.iter().any(|r| {
        lx <= r.hx + gap && hx + gap >= r.lx && ly <= r.hy + gap && hy + gap >= r.ly
    })
}

/// Draw a room position: x then y
pub(crate) fn draw_position(rng: &mut GameRng) -> (usize, usize) {
    let lx = XLIM + rng.rn2((COLNO - 2 * XLIM) as u32) as usize;
    let ly = YLIM + rng.rn2((ROWNO - 2 * YLIM) as u32) as usize;
    (lx, ly)
}

/// One room attempt: position x, position y, width, height
fn try_room(rooms: &mut Vec<Room>, ctx: &mut GenContext<'_>, escalation: u32) -> bool {
    let opts = ctx.options.builder;
    let (lx, ly) = draw_position(ctx.rng);
    let w = 3 + ctx.rng.rn2((opts.width_range >> escalation).max(1)) as usize;
    let h = 2 + ctx.rng.rn2((opts.height_range >> escalation).max(1)) as usize;
    let (hx, hy) = (lx + w - 1, ly + h - 1);
    if !room_fits(rooms, lx, ly, hx, hy, opts.room_gap) {
        return false;
    }
    rooms.push(Room::new(lx, ly, hx, hy));
    true
}

/// Place ordinary rooms and possibly a vault
pub fn make_rooms(level: &mut Level, ctx: &mut GenContext<'_>) {
    let opts = ctx.options.builder;
    let max_rooms = opts.max_rooms.min(MAXNROFROOMS);
    let mut rooms: Vec<Room> = Vec::new();
    let mut escalation = 0;
    loop {
        for _ in 0..opts.room_attempts {
            if rooms.len() >= max_rooms {
                break;
            }
            try_room(&mut rooms, ctx, escalation);
        }
        if rooms.len() >= opts.min_rooms || escalation >= opts.max_escalations {
            break;
        }
        escalation += 1;
        debug!(
            "{}: only {} rooms, escalating to step {}",
            level.dlevel,
            rooms.len(),
            escalation
        );
    }

    if rooms.is_empty() {
        warn!("{}: no room fitted, carving the emergency room", level.dlevel);
        let (lx, ly, hx, hy) = EMERGENCY_ROOM;
        rooms.push(Room::new(lx, ly, hx, hy));
    }

    rooms.sort_by_key(|r| r.lx);
    debug!("{}: {} rooms", level.dlevel, rooms.len());
    for room in rooms {
        level.add_room(room);
    }

    if ctx.rng.one_in(opts.vault_chance) {
        let (lx, ly) = draw_position(ctx.rng);
        if room_fits(&level.rooms, lx, ly, lx + 1, ly + 1, opts.room_gap) {
            debug!("{}: vault at ({lx}, {ly})", level.dlevel);
            let mut vault = Room::new(lx, ly, lx + 1, ly + 1);
            vault.set_kind(RoomKind::Vault);
            level.add_room(vault);
            level.flags.has_vault = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{BranchId, CellType, DLevel};
    use crate::tables::UniformTables;

    fn build(seed: u64, depth: i8) -> (Level, GameRng) {
        let options = GenOptions::default();
        let tables = UniformTables::default();
        let mut rng = GameRng::new(seed);
        let mut level = Level::new(DLevel::new(BranchId::Main, depth));
        let plan = StairPlan {
            up: (depth > 1).then(|| DLevel::new(BranchId::Main, depth - 1)),
            down: Some(DLevel::new(BranchId::Main, depth + 1)),
            branch: None,
        };
        let mut ctx = GenContext {
            rng: &mut rng,
            options: &options,
            tables: &tables,
        };
        generate_level(&mut level, &mut ctx, &plan).unwrap();
        (level, rng)
    }

    #[test]
    fn test_room_attempts_cost_four_draws() {
        let options = GenOptions::default();
        let tables = UniformTables::default();
        let mut rng = GameRng::new(42);
        let mut ctx = GenContext {
            rng: &mut rng,
            options: &options,
            tables: &tables,
        };
        let mut rooms = Vec::new();
        for attempt in 1..=20u64 {
            try_room(&mut rooms, &mut ctx, 0);
            assert_eq!(ctx.rng.call_count(), attempt * 4);
        }
    }

    #[test]
    fn test_rooms_sorted_and_separated() {
        for seed in 0..30 {
            let (level, _) = build(seed, 3);
            let ordinary: Vec<_> = level
                .rooms
                .iter()
                .filter(|r| r.kind != RoomKind::Vault)
                .collect();
            assert!(!ordinary.is_empty());
            assert!(ordinary.len() <= 10);
            assert!(ordinary.windows(2).all(|w| w[0].lx <= w[1].lx));
            for (i, a) in level.rooms.iter().enumerate() {
                assert!(a.hx <= COLNO - XLIM - 1 && a.hy <= ROWNO - YLIM - 2);
                for b in &level.rooms[i + 1..] {
                    let apart = a.hx + 3 < b.lx
                        || b.hx + 3 < a.lx
                        || a.hy + 3 < b.ly
                        || b.hy + 3 < a.ly;
                    assert!(apart, "seed {seed}: rooms too close");
                }
            }
        }
    }

    #[test]
    fn test_levels_have_stairs_and_floor() {
        for seed in 0..20 {
            let (level, _) = build(seed, 4);
            assert!(level.floor_count() > 0);
            assert!(level.find_downstairs().is_some(), "seed {seed}");
            assert!(level.find_upstairs().is_some(), "seed {seed}");
            let (x, y) = level.find_downstairs().unwrap();
            assert_eq!(level.cell(x, y).typ, CellType::Stairs);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (a, rng_a) = build(1234, 7);
        let (b, rng_b) = build(1234, 7);
        assert_eq!(a, b);
        assert_eq!(rng_a.call_count(), rng_b.call_count());
    }

    #[test]
    fn test_emergency_room_when_nothing_fits() {
        let mut options = GenOptions::default();
        options.builder.room_attempts = 0;
        options.builder.vault_chance = 1;
        let tables = UniformTables::default();
        let mut rng = GameRng::new(5);
        let mut level = Level::default();
        let mut ctx = GenContext {
            rng: &mut rng,
            options: &options,
            tables: &tables,
        };
        make_rooms(&mut level, &mut ctx);
        let (lx, ly, hx, hy) = EMERGENCY_ROOM;
        assert_eq!(level.rooms[0], Room::new(lx, ly, hx, hy));
        // only the vault chance and its position were drawn
        assert_eq!(ctx.rng.call_count(), 3);
    }
}
