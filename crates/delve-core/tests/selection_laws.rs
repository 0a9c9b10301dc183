//! Algebraic properties of coordinate selections

use proptest::prelude::*;

use delve_core::dungeon::Selection;
use delve_core::{GameRng, COLNO, ROWNO};

fn points() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..COLNO, 0..ROWNO), 0..40)
}

fn build(points: &[(usize, usize)]) -> Selection {
    let mut sel = Selection::new();
    for &(x, y) in points {
        sel.set(x, y);
    }
    sel
}

proptest! {
    #[test]
    fn union_is_commutative(a in points(), b in points()) {
        let (a, b) = (build(&a), build(&b));
        prop_assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn intersect_with_negation_is_empty(a in points()) {
        let a = build(&a);
        prop_assert!(a.intersect(&a.negate()).is_empty());
        prop_assert_eq!(a.union(&a.negate()).count(), COLNO * ROWNO);
    }

    #[test]
    fn difference_removes_other(a in points(), b in points()) {
        let (a, b) = (build(&a), build(&b));
        let d = a.difference(&b);
        prop_assert!(d.intersect(&b).is_empty());
        prop_assert_eq!(d.union(&a.intersect(&b)), a);
    }

    #[test]
    fn union_bounds_cover_both(a in points(), b in points()) {
        let (a, b) = (build(&a), build(&b));
        let u = a.union(&b).bounds();
        for part in [a.bounds(), b.bounds()].into_iter().flatten() {
            let u = u.expect("union of a non-empty set is non-empty");
            prop_assert!(u.lx <= part.lx && u.ly <= part.ly);
            prop_assert!(u.hx >= part.hx && u.hy >= part.hy);
        }
    }

    #[test]
    fn grow_keeps_original(a in points()) {
        let a = build(&a);
        let g = a.grow();
        prop_assert_eq!(g.intersect(&a), a.clone());
        prop_assert!(g.count() >= a.count());
    }

    #[test]
    fn random_coordinate_draws_once(a in points(), seed in any::<u64>()) {
        let a = build(&a);
        let mut rng = GameRng::new(seed);
        let picked = a.random_coordinate(&mut rng);
        if a.is_empty() {
            prop_assert_eq!(picked, None);
            prop_assert_eq!(rng.call_count(), 0);
        } else {
            let (x, y) = picked.expect("non-empty selection yields a coordinate");
            prop_assert!(a.contains(x, y));
            prop_assert_eq!(rng.call_count(), 1);
        }
    }
}
