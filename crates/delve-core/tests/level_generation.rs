//! Whole-level generation through a session
//!
//! Reproducibility, draw order, stair placement and the dungeon layout as
//! seen from outside the crate.

use delve_core::dungeon::{wallify, BranchId, CellType, DLevel, Level};
use delve_core::options::GenOptions;
use delve_core::{Session, COLNO, ROWNO};

// ============================================================================
// Helpers
// ============================================================================

fn session(seed: u64) -> Session {
    Session::new(seed, GenOptions::default()).expect("standard topology resolves")
}

fn count_cells(level: &Level, typ: CellType) -> usize {
    level
        .cells
        .iter()
        .flat_map(|col| col.iter())
        .filter(|cell| cell.typ == typ)
        .count()
}

// ============================================================================
// Reproducibility
// ============================================================================

#[test]
fn test_same_seed_same_levels() {
    for seed in [1u64, 42, 12345] {
        let mut a = session(seed);
        let mut b = session(seed);
        for depth in 1..=6 {
            let la = a.generate_level(BranchId::Main, depth).unwrap();
            let lb = b.generate_level(BranchId::Main, depth).unwrap();
            assert_eq!(
                serde_json::to_string(&la).unwrap(),
                serde_json::to_string(&lb).unwrap(),
                "seed {seed} depth {depth} differs"
            );
        }
        assert_eq!(a.rng().call_count(), b.rng().call_count());
    }
}

#[test]
fn test_different_seeds_differ() {
    let la = session(1).generate_level(BranchId::Main, 1).unwrap();
    let lb = session(2).generate_level(BranchId::Main, 1).unwrap();
    assert_ne!(la, lb);
}

#[test]
fn test_trace_starts_with_room_attempt() {
    let mut s = session(42);
    s.rng_mut().enable_tracing();
    s.generate_level(BranchId::Main, 1).unwrap();
    let trace = s.rng_mut().take_trace();

    let head: Vec<(&str, u64)> = trace
        .iter()
        .take(4)
        .map(|e| (e.func.as_str(), e.arg))
        .collect();
    let expected = [
        ("rn2", (COLNO - 8) as u64),
        ("rn2", (ROWNO - 4) as u64),
        ("rn2", 13),
        ("rn2", 4),
    ];
    assert_eq!(head, expected, "first room attempt draws x, y, width, height");
    assert_eq!(trace[0].seq, 4, "topology resolution draws first");
}

#[test]
fn test_trace_matches_counter() {
    let mut s = session(7);
    let before = s.rng().call_count();
    s.rng_mut().enable_tracing();
    s.generate_level(BranchId::Main, 2).unwrap();
    let trace = s.rng_mut().take_trace();
    assert_eq!(trace.len() as u64, s.rng().call_count() - before);
    assert!(trace.windows(2).all(|w| w[1].seq == w[0].seq + 1));
}

// ============================================================================
// Level contents
// ============================================================================

#[test]
fn test_first_level_stairs() {
    for seed in (0..20).chain([42]) {
        let level = session(seed).generate_level(BranchId::Main, 1).unwrap();
        assert!(!level.rooms.is_empty(), "seed {seed}: no rooms");
        assert!(
            level.stairs.iter().any(|s| !s.up),
            "seed {seed}: no down stairs"
        );
        assert_eq!(
            level.stairs.iter().filter(|s| s.up).count(),
            0,
            "seed {seed}: first level has up stairs"
        );
        assert!(count_cells(&level, CellType::Room) > 0);
    }
}

#[test]
fn test_middle_level_has_both_stairs() {
    let mut s = session(99);
    let level = s.generate_level(BranchId::Main, 10).unwrap();
    let up = level.find_upstairs().expect("up stairs");
    let down = level.find_downstairs().expect("down stairs");
    assert_ne!(up, down);
    assert_eq!(level.cell(up.0, up.1).typ, CellType::Stairs);
}

#[test]
fn test_monsters_on_distinct_passable_cells() {
    let mut s = session(2024);
    for depth in 1..=4 {
        let level = s.generate_level(BranchId::Main, depth).unwrap();
        for m in &level.monsters {
            assert!(
                level.cell(m.x, m.y).typ.is_passable(),
                "monster {:?} placed on {:?}",
                m.ident,
                level.cell(m.x, m.y).typ
            );
        }
        let mut seen = std::collections::HashSet::new();
        for m in &level.monsters {
            assert!(seen.insert((m.x, m.y)), "two monsters at ({}, {})", m.x, m.y);
        }
    }
}

#[test]
fn test_wallify_is_idempotent() {
    let mut s = session(5);
    let level = s.generate_level(BranchId::Main, 3).unwrap();
    let count = s.rng().call_count();
    let mut again = level.clone();
    wallify(&mut again);
    assert_eq!(again, level, "wallify changed a finished level");
    assert_eq!(s.rng().call_count(), count);
}

// ============================================================================
// Topology
// ============================================================================

#[test]
fn test_mines_attachment_range() {
    for seed in 0..100 {
        let s = session(seed);
        let at = s.topology().attachment(BranchId::Mines).expect("mines attach");
        assert_eq!(at.branch, BranchId::Main);
        assert!((2..=4).contains(&at.depth), "seed {seed}: mines at {at}");
        assert_eq!(s.topology().attachment(BranchId::Mines), Some(at));
    }
}

#[test]
fn test_attachment_level_carries_branch_stairs() {
    let mut s = session(31);
    let at = s.topology().attachment(BranchId::Mines).unwrap();
    for depth in 1..at.depth {
        s.generate_level(BranchId::Main, depth).unwrap();
    }
    let level = s.generate_level(BranchId::Main, at.depth).unwrap();
    let link = level
        .stairs
        .iter()
        .find(|st| st.branch)
        .expect("branch stairs on attachment level");
    assert_eq!(link.destination, DLevel::new(BranchId::Mines, 1));
    assert!(!link.up);
}

#[test]
fn test_mines_entry_links_back() {
    let mut s = session(8);
    let at = s.topology().attachment(BranchId::Mines).unwrap();
    let level = s.generate_level(BranchId::Mines, 1).unwrap();
    let link = level.stairs.iter().find(|st| st.branch).unwrap();
    assert_eq!(link.destination, at);
    assert!(link.up);
}

#[test]
fn test_out_of_range_depth() {
    let mut s = session(3);
    let levels = s.topology().num_levels(BranchId::Sokoban).unwrap();
    assert!(s.generate_level(BranchId::Sokoban, levels + 1).is_err());
    assert!(s.generate_level(BranchId::Sokoban, levels).is_ok());
}
