//! Snapshot and resume of a generation session

use delve_core::dungeon::{BranchId, DLevel};
use delve_core::options::GenOptions;
use delve_core::save::SessionSnapshot;
use delve_core::Session;

#[test]
fn test_resumed_session_continues_identically() {
    let mut original = Session::new(1234, GenOptions::default()).unwrap();
    original.generate_level(BranchId::Main, 1).unwrap();
    original.generate_level(BranchId::Main, 2).unwrap();

    let json = original.snapshot().to_json().unwrap();
    let snapshot = SessionSnapshot::from_json(&json).unwrap();
    let mut resumed = Session::from_snapshot(&snapshot, GenOptions::default());

    assert_eq!(resumed.rng().call_count(), original.rng().call_count());
    assert_eq!(resumed.topology(), original.topology());
    for depth in 3..=5 {
        let a = original.generate_level(BranchId::Main, depth).unwrap();
        let b = resumed.generate_level(BranchId::Main, depth).unwrap();
        assert_eq!(a, b, "depth {depth} diverged after resume");
    }
}

#[test]
fn test_restore_rewinds_generation() {
    let mut s = Session::new(55, GenOptions::default()).unwrap();
    let snapshot = s.snapshot();
    let first = s.generate_level(BranchId::Mines, 1).unwrap();
    s.restore(&snapshot);
    let again = s.generate_level(BranchId::Mines, 1).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_variant_choices_survive_resume() {
    let big = DLevel::new(BranchId::Main, 12);
    let mut s = Session::new(8, GenOptions::default())
        .unwrap()
        .with_builtin_levels()
        .unwrap();
    s.generate_level(BranchId::Main, 12).unwrap();
    let choice = s.registry().choice(big).unwrap();

    let snapshot = s.snapshot();
    assert!(snapshot.choices.contains(&(big, choice)));

    let mut fresh = Session::new(8, GenOptions::default())
        .unwrap()
        .with_builtin_levels()
        .unwrap();
    fresh.restore(&snapshot);
    assert_eq!(fresh.registry().choice(big), Some(choice));
    let before = fresh.rng().call_count();
    fresh.generate_level(BranchId::Main, 12).unwrap();
    s.restore(&snapshot);
    s.generate_level(BranchId::Main, 12).unwrap();
    assert_eq!(fresh.rng().call_count(), s.rng().call_count());
    assert!(fresh.rng().call_count() > before);
}
