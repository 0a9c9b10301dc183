//! Corridor generation
//!
//! Implements the 4-phase corridor algorithm:
//! 1. Connect adjacent rooms (room[i] to room[i+1]), with a small chance to stop early
//! 2. Connect rooms two steps apart if not already connected
//! 3. Connect every remaining unconnected pair
//! 4. Add random extra corridors ("nxcor") that may dead-end

use log::trace;

use crate::consts::MAX_CORRIDOR_STEPS;
use crate::tables::Ident;
use crate::{COLNO, ROWNO};

use super::generation::GenContext;
use super::{CellType, DoorState, Level, ObjectPlacement, RoomKind};

/// Tracks room connectivity using equivalence classes (smeq[] in C)
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    /// Each room's equivalence class (rooms in same class are connected)
    smeq: Vec<usize>,
}

impl ConnectivityTracker {
    /// Create a new tracker for the given number of rooms
    pub fn new(num_rooms: usize) -> Self {
        Self {
            smeq: (0..num_rooms).collect(),
        }
    }

    /// Check if two rooms are connected (in same equivalence class)
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        self.smeq[a] == self.smeq[b]
    }

    /// Merge equivalence classes when rooms are connected
    pub fn merge(&mut self, a: usize, b: usize) {
        let (keep, drop) = if self.smeq[a] < self.smeq[b] {
            (self.smeq[a], self.smeq[b])
        } else {
            (self.smeq[b], self.smeq[a])
        };
        for eq in &mut self.smeq {
            if *eq == drop {
                *eq = keep;
            }
        }
    }

    /// Check if all rooms are connected
    pub fn all_connected(&self) -> bool {
        self.smeq.windows(2).all(|w| w[0] == w[1])
    }
}

/// Rooms taking part in corridor digging: all of them except a trailing vault
pub fn joinable_rooms(level: &Level) -> usize {
    match level.rooms.last() {
        Some(room) if room.kind == RoomKind::Vault => level.rooms.len() - 1,
        _ => level.rooms.len(),
    }
}

/// Dig corridors between the level's rooms
pub fn make_corridors(level: &mut Level, ctx: &mut GenContext<'_>) -> ConnectivityTracker {
    let nroom = joinable_rooms(level);
    let mut conn = ConnectivityTracker::new(nroom);
    let opts = ctx.options.builder;

    for a in 0..nroom.saturating_sub(1) {
        join(level, ctx, &mut conn, a, a + 1, false);
        if ctx.rng.one_in(opts.corridor_early_stop) {
            break;
        }
    }

    for a in 0..nroom.saturating_sub(2) {
        if !conn.are_connected(a, a + 2) {
            join(level, ctx, &mut conn, a, a + 2, false);
        }
    }

    let mut any = true;
    let mut a = 0;
    while any && a < nroom {
        any = false;
        for b in 0..nroom {
            if !conn.are_connected(a, b) {
                join(level, ctx, &mut conn, a, b, false);
                any = true;
            }
        }
        a += 1;
    }

    if nroom > 2 {
        let extra = ctx.rng.rn2(nroom as u32) + 4;
        for _ in 0..extra {
            let a = ctx.rng.rn2(nroom as u32) as usize;
            let mut b = ctx.rng.rn2(nroom as u32 - 2) as usize;
            if b >= a {
                b += 2;
            }
            join(level, ctx, &mut conn, a, b, true);
        }
    }
    conn
}

/// Check whether a door may be made at a wall position (okdoor)
fn ok_door(level: &Level, x: usize, y: usize) -> bool {
    matches!(level.cells[x][y].typ, CellType::HWall | CellType::VWall) && !by_door(level, x, y)
}

/// Orthogonally adjacent to an existing door (bydoor)
fn by_door(level: &Level, x: usize, y: usize) -> bool {
    let (x, y) = (x as i32, y as i32);
    [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]
        .into_iter()
        .any(|(nx, ny)| level.typ_at(nx, ny).is_door())
}

/// Pick a door position on a wall segment: one random try,
/// then a scan for a usable wall, then for an existing door
fn find_door_pos(
    level: &Level,
    ctx: &mut GenContext<'_>,
    xl: usize,
    yl: usize,
    xh: usize,
    yh: usize,
) -> (usize, usize) {
    let x = ctx.rng.rn1((xh - xl + 1) as u32, xl as u32) as usize;
    let y = ctx.rng.rn1((yh - yl + 1) as u32, yl as u32) as usize;
    if ok_door(level, x, y) {
        return (x, y);
    }
    for x in xl..=xh {
        for y in yl..=yh {
            if ok_door(level, x, y) {
                return (x, y);
            }
        }
    }
    for x in xl..=xh {
        for y in yl..=yh {
            if level.cells[x][y].typ.is_door() {
                return (x, y);
            }
        }
    }
    (xl, yh)
}

/// Join two rooms with a corridor
fn join(
    level: &mut Level,
    ctx: &mut GenContext<'_>,
    conn: &mut ConnectivityTracker,
    a: usize,
    b: usize,
    nxcor: bool,
) {
    let croom = level.rooms[a].clone();
    let troom = level.rooms[b].clone();

    let (dx, dy, dd, tt): (i32, i32, _, _) = if troom.lx > croom.hx {
        let xx = croom.hx + 1;
        let tx = troom.lx - 1;
        let dd = find_door_pos(level, ctx, xx, croom.ly, xx, croom.hy);
        let tt = find_door_pos(level, ctx, tx, troom.ly, tx, troom.hy);
        (1, 0, dd, tt)
    } else if troom.hy < croom.ly {
        let yy = croom.ly - 1;
        let ty = troom.hy + 1;
        let dd = find_door_pos(level, ctx, croom.lx, yy, croom.hx, yy);
        let tt = find_door_pos(level, ctx, troom.lx, ty, troom.hx, ty);
        (0, -1, dd, tt)
    } else if troom.hx < croom.lx {
        let xx = croom.lx - 1;
        let tx = troom.hx + 1;
        let dd = find_door_pos(level, ctx, xx, croom.ly, xx, croom.hy);
        let tt = find_door_pos(level, ctx, tx, troom.ly, tx, troom.hy);
        (-1, 0, dd, tt)
    } else {
        let yy = croom.hy + 1;
        let ty = troom.ly - 1;
        let dd = find_door_pos(level, ctx, croom.lx, yy, croom.hx, yy);
        let tt = find_door_pos(level, ctx, troom.lx, ty, troom.hx, ty);
        (0, 1, dd, tt)
    };

    let org = (dd.0 as i32 + dx, dd.1 as i32 + dy);
    let dest = (tt.0 as i32 - dx, tt.1 as i32 - dy);

    if nxcor && level.typ_at(org.0, org.1) != CellType::Stone {
        return;
    }
    if ok_door(level, dd.0, dd.1) || !nxcor {
        place_door(level, ctx, dd.0, dd.1, a);
    }

    if !dig_corridor(level, ctx, org, dest, nxcor) {
        return;
    }

    if ok_door(level, tt.0, tt.1) || !nxcor {
        place_door(level, ctx, tt.0, tt.1, b);
    }
    conn.merge(a, b);
}

/// Dig from `org` to `dest` through stone, turning toward the target.
/// Returns false when the dig is abandoned.
pub fn dig_corridor(
    level: &mut Level,
    ctx: &mut GenContext<'_>,
    org: (i32, i32),
    dest: (i32, i32),
    nxcor: bool,
) -> bool {
    let (mut xx, mut yy) = org;
    let (tx, ty) = dest;
    if xx <= 0
        || yy <= 0
        || tx <= 0
        || ty <= 0
        || xx > COLNO as i32 - 1
        || tx > COLNO as i32 - 1
        || yy > ROWNO as i32 - 1
        || ty > ROWNO as i32 - 1
    {
        return false;
    }

    let opts = ctx.options.builder;
    let (mut dx, mut dy) = if tx > xx {
        (1, 0)
    } else if ty > yy {
        (0, 1)
    } else if tx < xx {
        (-1, 0)
    } else {
        (0, -1)
    };

    xx -= dx;
    yy -= dy;
    let mut steps = 0;
    let passable = |typ: CellType| {
        matches!(
            typ,
            CellType::Stone | CellType::Corridor | CellType::SecretCorridor
        )
    };

    while xx != tx || yy != ty {
        steps += 1;
        if steps > MAX_CORRIDOR_STEPS || (nxcor && ctx.rng.one_in(opts.nxcor_abort)) {
            return false;
        }

        xx += dx;
        yy += dy;
        if xx >= COLNO as i32 - 1 || xx <= 0 || yy <= 0 || yy >= ROWNO as i32 - 1 {
            return false;
        }

        let (ux, uy) = (xx as usize, yy as usize);
        match level.cells[ux][uy].typ {
            CellType::Stone => {
                if ctx.rng.one_in(opts.secret_corridor) {
                    level.cells[ux][uy].typ = CellType::SecretCorridor;
                } else {
                    level.cells[ux][uy].typ = CellType::Corridor;
                    if nxcor && ctx.rng.one_in(50) {
                        trace!("boulder in extra corridor at ({ux}, {uy})");
                        level.add_object(ObjectPlacement::new(ux, uy, Ident::named("boulder")));
                    }
                }
            }
            CellType::Corridor | CellType::SecretCorridor => {}
            _ => return false,
        }

        // find next corridor position
        let mut dix = (xx - tx).abs();
        let mut diy = (yy - ty).abs();

        if dix > diy && diy != 0 && ctx.rng.one_in((dix - diy + 1) as u32) {
            dix = 0;
        } else if diy > dix && dix != 0 && ctx.rng.one_in((diy - dix + 1) as u32) {
            diy = 0;
        }

        // do we have to change direction?
        if dy != 0 && dix > diy {
            let ddx = if xx > tx { -1 } else { 1 };
            if passable(level.typ_at(xx + ddx, yy)) {
                dx = ddx;
                dy = 0;
                continue;
            }
        } else if dx != 0 && diy > dix {
            let ddy = if yy > ty { -1 } else { 1 };
            if passable(level.typ_at(xx, yy + ddy)) {
                dy = ddy;
                dx = 0;
                continue;
            }
        }

        // continue straight on?
        if passable(level.typ_at(xx + dx, yy + dy)) {
            continue;
        }

        // try to change direction
        if dx != 0 {
            dx = 0;
            dy = if ty < yy { -1 } else { 1 };
        } else {
            dy = 0;
            dx = if tx < xx { -1 } else { 1 };
        }
        if passable(level.typ_at(xx + dx, yy + dy)) {
            continue;
        }
        dy = -dy;
        dx = -dx;
    }
    true
}

/// Make a door in a room wall (dodoor/dosdoor)
///
/// Always spends the secret-door draw and the door-state draw, plus the
/// trap draw for closed or locked doors on deep levels. Shop doors are
/// then forced to plain open doors.
pub fn place_door(level: &mut Level, ctx: &mut GenContext<'_>, x: usize, y: usize, room: usize) {
    let opts = ctx.options.builder;
    let was_wall = level.cells[x][y].typ.is_wall();
    let secret = ctx.rng.one_in(opts.secret_door) && was_wall;

    let mut state = if secret {
        DoorState::CLOSED
    } else {
        ctx.options.doors.pick(ctx.rng)
    };
    if state.intersects(DoorState::CLOSED | DoorState::LOCKED)
        && level.dlevel.depth >= opts.trapped_door_depth
        && ctx.rng.one_in(opts.trapped_door)
    {
        state |= DoorState::TRAPPED;
    }

    let shop = level.rooms[room].kind == RoomKind::Shop;
    if shop {
        level.set_door(x, y, DoorState::OPEN, false);
    } else {
        level.set_door(x, y, state, secret);
    }
    if was_wall {
        level.rooms[room].door_count += 1;
    }
}
