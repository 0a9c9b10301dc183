//! Stair and branch placement for generated levels

use log::warn;

use crate::consts::STAIR_POSITION_TRIES;
use crate::error::{Connection, GenError, Result};
use crate::rng::GameRng;
use crate::{COLNO, ROWNO};

use super::corridor::joinable_rooms;
use super::generation::GenContext;
use super::{BranchLink, DLevel, Level, LinkKind, RoomKind, StairPlan};

/// Pick a room for the next connection: one draw among the rooms not yet
/// holding one, or among all rooms once every room is used
fn choose_room(rng: &mut GameRng, nroom: usize, used: &[usize]) -> usize {
    let free: Vec<usize> = (0..nroom).filter(|i| !used.contains(i)).collect();
    if free.is_empty() {
        rng.rn2(nroom as u32) as usize
    } else {
        free[rng.rn2(free.len() as u32) as usize]
    }
}

/// Free floor position inside a room: up to ten random tries, then a
/// row-major scan of the room, then of the whole level
pub fn find_stair_pos(level: &Level, rng: &mut GameRng, room: usize) -> Option<(usize, usize)> {
    let r = &level.rooms[room];
    for _ in 0..STAIR_POSITION_TRIES {
        let (x, y) = r.random_point(rng);
        if level.is_free_floor(x, y) {
            return Some((x, y));
        }
    }
    if let Some(pos) = r.interior().points().find(|&(x, y)| level.is_free_floor(x, y)) {
        return Some(pos);
    }
    warn!(
        "{}: room {} has no free floor, scanning the level",
        level.dlevel, room
    );
    (0..ROWNO)
        .flat_map(|y| (0..COLNO).map(move |x| (x, y)))
        .find(|&(x, y)| level.is_free_floor(x, y))
}

/// Put a branch connection at a position
pub fn place_link(level: &mut Level, x: usize, y: usize, link: &BranchLink) {
    match link.kind {
        LinkKind::StairsDown => level.add_stairs(x, y, false, link.destination, true),
        LinkKind::StairsUp => level.add_stairs(x, y, true, link.destination, true),
        LinkKind::Portal => level.add_portal(x, y, link.destination),
    }
}

fn place_one(
    level: &Level,
    rng: &mut GameRng,
    nroom: usize,
    used: &mut Vec<usize>,
    connection: Connection,
) -> Result<(usize, usize)> {
    let missing = GenError::NoStairPosition {
        dlevel: level.dlevel,
        connection,
    };
    if nroom == 0 {
        return Err(missing);
    }
    let room = choose_room(rng, nroom, used);
    used.push(room);
    find_stair_pos(level, rng, room).ok_or(missing)
}

/// Place the stairs and branch connection the topology asks for
///
/// Fails when a required connection finds no free floor anywhere.
pub fn place_stairs(level: &mut Level, ctx: &mut GenContext<'_>, plan: &StairPlan) -> Result<()> {
    let nroom = joinable_rooms(level);
    let mut used = Vec::new();

    let stairs = [
        (plan.down, false, Connection::DownStairs),
        (plan.up, true, Connection::UpStairs),
    ];
    for (destination, up, connection) in stairs {
        let Some(destination) = destination else {
            continue;
        };
        let (x, y) = place_one(level, ctx.rng, nroom, &mut used, connection)?;
        level.add_stairs(x, y, up, destination, false);
    }
    if let Some(link) = plan.branch {
        let (x, y) = place_one(level, ctx.rng, nroom, &mut used, Connection::BranchLink)?;
        place_link(level, x, y, &link);
    }

    if let Some(room) = level
        .find_upstairs()
        .and_then(|(x, y)| level.room_at(x, y))
    {
        if level.rooms[room].kind == RoomKind::Ordinary {
            level.rooms[room].set_kind(RoomKind::Arrival);
        }
    }
    Ok(())
}
