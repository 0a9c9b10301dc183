//! Random number generation for level generation
//!
//! Wraps the ISAAC64 engine from `delve-rng` with the convenience helpers the
//! builders use. Every helper is expressed in terms of counted draws so that
//! the draw trace stays meaningful.

use delve_rng::{Isaac64, RngError, RngState, RngTraceEntry};
use serde::{Deserialize, Serialize};

/// Session random number generator
///
/// Serializes to the full engine state, so a restored generator continues
/// with the same future draws.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: Isaac64,
    seed: u64,
}

#[derive(Serialize, Deserialize)]
struct SavedRng {
    seed: u64,
    state: RngState,
}

impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        SavedRng {
            seed: self.seed,
            state: self.rng.snapshot(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let saved = SavedRng::deserialize(deserializer)?;
        let rng = Isaac64::from_state(saved.state).map_err(serde::de::Error::custom)?;
        Ok(Self {
            rng,
            seed: saved.seed,
        })
    }
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Isaac64::new(seed),
            seed,
        }
    }

    /// Get the seed used to create this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// rn2(n): 0..n-1. Panics on a zero bound.
    #[track_caller]
    pub fn rn2(&mut self, n: u32) -> u32 {
        self.rng.rn2(n)
    }

    /// rnd(n): 1..n. Panics on a zero bound.
    #[track_caller]
    pub fn rnd(&mut self, n: u32) -> u32 {
        self.rng.rnd(n)
    }

    /// rn1(x, y): y..y+x-1
    #[track_caller]
    pub fn rn1(&mut self, x: u32, y: u32) -> u32 {
        self.rng.rn1(x, y)
    }

    /// d(n, m): sum of n rolls of 1..m, drawn in order
    #[track_caller]
    pub fn dice(&mut self, n: u32, m: u32) -> u32 {
        self.rng.d(n, m)
    }

    /// rnl(n): luck-adjusted 0..n-1
    #[track_caller]
    pub fn rnl(&mut self, n: u32, luck: i32) -> u32 {
        self.rng.rnl(n, luck)
    }

    /// rne(x): truncated geometric distribution
    #[track_caller]
    pub fn rne(&mut self, x: u32, level: u32) -> u32 {
        self.rng.rne(x, level)
    }

    /// rnz(i): logarithmic spread around i
    #[track_caller]
    pub fn rnz(&mut self, i: i32, level: u32) -> i32 {
        self.rng.rnz(i, level)
    }

    /// Returns true with probability 1/n
    #[track_caller]
    pub fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Choose a random element from a slice; an empty slice costs no draw
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rn2(items.len() as u32) as usize])
        }
    }

    /// Number of logical draws so far
    pub fn call_count(&self) -> u64 {
        self.rng.call_count()
    }

    pub fn enable_tracing(&mut self) {
        self.rng.enable_tracing();
    }

    pub fn disable_tracing(&mut self) {
        self.rng.disable_tracing();
    }

    pub fn trace(&self) -> &[RngTraceEntry] {
        self.rng.trace()
    }

    pub fn take_trace(&mut self) -> Vec<RngTraceEntry> {
        self.rng.take_trace()
    }

    /// Engine state for save data
    pub fn snapshot(&self) -> RngState {
        self.rng.snapshot()
    }

    /// Resume from a previously captured state
    pub fn restore(&mut self, state: &RngState) -> Result<(), RngError> {
        self.rng.restore(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rn2_bounds() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            let n = rng.rn2(10);
            assert!(n < 10);
        }
    }

    #[test]
    fn test_dice() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            let n = rng.dice(2, 6);
            assert!((2..=12).contains(&n));
        }
        assert_eq!(rng.call_count(), 2000);
    }

    #[test]
    fn test_reproducibility() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.rn2(100), rng2.rn2(100));
        }
    }

    #[test]
    #[should_panic(expected = "draw bound must be positive")]
    fn test_zero_bound_fails_fast() {
        let mut rng = GameRng::new(42);
        rng.rn2(0);
    }

    #[test]
    fn test_choose_empty_costs_nothing() {
        let mut rng = GameRng::new(42);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.call_count(), 0);
    }

    #[test]
    fn test_serde_resumes_sequence() {
        let mut rng = GameRng::new(7);
        rng.rn2(10);
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seed(), 7);
        assert_eq!(restored.call_count(), 1);
        for _ in 0..50 {
            assert_eq!(rng.rn2(1000), restored.rn2(1000));
        }
    }
}
