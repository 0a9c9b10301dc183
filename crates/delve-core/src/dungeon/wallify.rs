//! Wall creation and glyph derivation (wallification)
//!
//! Solid stone touching room floor, orthogonally or diagonally, first
//! becomes wall. Stone next to corridors only is left alone. Then each
//! wall cell's specific glyph is recomputed from which of its four
//! orthogonal neighbours continue the wall. Walls, doors and secret doors
//! count as continuations. A second run finds no stone left beside floor
//! and derives the same glyphs, so it changes nothing. The pass never
//! touches the random generator.

use super::{CellType, Level};
use crate::{COLNO, ROWNO};

fn connects(level: &Level, x: i32, y: i32) -> bool {
    let typ = level.typ_at(x, y);
    typ.is_wall() || typ.is_door()
}

/// Terrain a room wall has to enclose
fn is_room_floor(typ: CellType) -> bool {
    matches!(
        typ,
        CellType::Room
            | CellType::Stairs
            | CellType::Ladder
            | CellType::Fountain
            | CellType::Throne
            | CellType::Sink
            | CellType::Grave
            | CellType::Altar
            | CellType::Ice
    )
}

fn touches_room_floor(level: &Level, x: i32, y: i32) -> bool {
    (-1..=1).any(|dx| (-1..=1).any(|dy| is_room_floor(level.typ_at(x + dx, y + dy))))
}

/// Glyph for a wall cell given its N, S, E, W continuations
fn wall_for(n: bool, s: bool, e: bool, w: bool, open_sideways: bool) -> CellType {
    match (n, s, e, w) {
        (true, true, true, true) => CellType::CrossWall,
        (true, true, true, false) => CellType::TRWall,
        (true, true, false, true) => CellType::TLWall,
        (true, false, true, true) => CellType::TUWall,
        (false, true, true, true) => CellType::TDWall,
        (false, true, true, false) => CellType::TLCorner,
        (false, true, false, true) => CellType::TRCorner,
        (true, false, true, false) => CellType::BLCorner,
        (true, false, false, true) => CellType::BRCorner,
        (true, _, false, false) | (_, true, false, false) => CellType::VWall,
        (false, false, _, _) if e || w => CellType::HWall,
        _ if open_sideways => CellType::VWall,
        _ => CellType::HWall,
    }
}

/// Wall in exposed room floor, then re-derive every wall glyph
pub fn wallify(level: &mut Level) {
    let mut exposed = Vec::new();
    for x in 0..COLNO {
        for y in 0..ROWNO {
            if level.cells[x][y].typ == CellType::Stone
                && touches_room_floor(level, x as i32, y as i32)
            {
                exposed.push((x, y));
            }
        }
    }
    for (x, y) in exposed {
        level.cells[x][y].typ = CellType::HWall;
    }

    let mut updates = Vec::new();
    for x in 0..COLNO {
        for y in 0..ROWNO {
            let typ = level.cells[x][y].typ;
            if !typ.is_wall() || typ == CellType::DBWall {
                continue;
            }
            let (xi, yi) = (x as i32, y as i32);
            let n = connects(level, xi, yi - 1);
            let s = connects(level, xi, yi + 1);
            let e = connects(level, xi + 1, yi);
            let w = connects(level, xi - 1, yi);
            let open_sideways =
                level.typ_at(xi - 1, yi).is_passable() || level.typ_at(xi + 1, yi).is_passable();
            let derived = wall_for(n, s, e, w, open_sideways);
            if derived != typ {
                updates.push((x, y, derived));
            }
        }
    }
    for (x, y, typ) in updates {
        level.cells[x][y].typ = typ;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{Room, Selection};
    use crate::rng::GameRng;

    #[test]
    fn test_room_walls_are_stable() {
        let mut level = Level::default();
        level.add_room(Room::new(10, 5, 14, 8));
        let before = level.clone();
        wallify(&mut level);
        assert_eq!(level, before);
    }

    #[test]
    fn test_plain_walls_get_corners() {
        let mut level = Level::default();
        let outline = Selection::outline(3, 3, 8, 6).unwrap();
        for (x, y) in outline.iter() {
            level.cells[x][y].typ = if y == 3 || y == 6 {
                CellType::HWall
            } else {
                CellType::VWall
            };
        }
        wallify(&mut level);
        assert_eq!(level.cells[3][3].typ, CellType::TLCorner);
        assert_eq!(level.cells[8][3].typ, CellType::TRCorner);
        assert_eq!(level.cells[3][6].typ, CellType::BLCorner);
        assert_eq!(level.cells[8][6].typ, CellType::BRCorner);
        assert_eq!(level.cells[5][3].typ, CellType::HWall);
        assert_eq!(level.cells[3][4].typ, CellType::VWall);
    }

    #[test]
    fn test_shared_wall_makes_t_junctions() {
        let mut level = Level::default();
        level.add_room(Room::new(10, 5, 12, 7));
        level.add_room(Room::new(14, 5, 16, 7));
        wallify(&mut level);
        assert_eq!(level.cells[13][4].typ, CellType::TDWall);
        assert_eq!(level.cells[13][8].typ, CellType::TUWall);
        assert_eq!(level.cells[13][6].typ, CellType::VWall);
    }

    #[test]
    fn test_idempotent_and_drawless() {
        let mut level = Level::default();
        level.add_room(Room::new(10, 5, 12, 7));
        level.add_room(Room::new(14, 5, 16, 7));
        level.cells[20][10].typ = CellType::HWall;
        level.cells[21][10].typ = CellType::Room;
        let rng = GameRng::new(1);
        wallify(&mut level);
        let once = level.clone();
        wallify(&mut level);
        assert_eq!(level, once);
        assert_eq!(level.cells[20][10].typ, CellType::VWall);
        assert!(level.cells[22][10].typ.is_wall());
        assert_eq!(rng.call_count(), 0);
    }

    #[test]
    fn test_carved_floor_gets_walls() {
        let mut level = Level::default();
        for x in 10..=20 {
            for y in 5..=10 {
                level.cells[x][y].typ = CellType::Room;
            }
        }
        wallify(&mut level);
        assert_eq!(level.cells[9][4].typ, CellType::TLCorner);
        assert_eq!(level.cells[21][11].typ, CellType::BRCorner);
        assert_eq!(level.cells[10][4].typ, CellType::HWall);
        assert_eq!(level.cells[9][5].typ, CellType::VWall);
        assert_eq!(level.cells[15][7].typ, CellType::Room);
        assert_eq!(level.cells[8][5].typ, CellType::Stone);

        let once = level.clone();
        wallify(&mut level);
        assert_eq!(level, once);
    }

    #[test]
    fn test_corridor_leaves_stone_alone() {
        let mut level = Level::default();
        for x in 30..=40 {
            level.cells[x][12].typ = CellType::Corridor;
        }
        wallify(&mut level);
        assert_eq!(level.cells[35][11].typ, CellType::Stone);
        assert_eq!(level.cells[35][13].typ, CellType::Stone);
        assert_eq!(level.cells[29][12].typ, CellType::Stone);
    }
}
