//! ISAAC64 draw engine
//!
//! A single linear stream with typed draw primitives (`rn2`, `rnd`, `d`,
//! `rn1` and the biased `rnl`/`rne`/`rnz`), a logical call counter, an
//! optional draw trace and exact snapshot/restore of the internal state.
//!
//! Every primitive call is one logical draw per consumed word; `d(n, x)` is
//! `n` draws summed in call order. A zero bound is a programmer error and
//! panics in every build.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the ISAAC64 state arrays (2^8 = 256)
const ISAAC64_SZ_LOG: usize = 8;
const ISAAC64_SZ: usize = 1 << ISAAC64_SZ_LOG;

/// Blob header identifying a serialized generator state
const BLOB_MAGIC: &str = "DLVRNG";
/// Version of the blob layout
pub const BLOB_VERSION: u32 = 1;

/// Errors raised while restoring a persisted generator state
#[derive(Debug, Error)]
pub enum RngError {
    #[error("state blob is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("state blob has wrong magic '{0}'")]
    BadMagic(String),

    #[error("incompatible state blob version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("corrupted generator state: {0}")]
    Corrupted(&'static str),
}

/// One recorded draw, for diffing against a reference trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngTraceEntry {
    /// Sequence number (0-indexed logical draw)
    pub seq: u64,
    /// Primitive name ("rn2", "rnd", "d", "raw")
    pub func: String,
    /// Argument (bound for rn2/rnd, sides for a d component)
    pub arg: u64,
    /// Result value returned for this draw
    pub result: u64,
    /// Raw u64 consumed from ISAAC64
    pub raw: u64,
}

/// Complete generator state. Identical states produce identical futures.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    /// Results buffer
    r: Vec<u64>,
    /// Memory state
    m: Vec<u64>,
    /// Accumulator
    a: u64,
    /// Previous result
    b: u64,
    /// Counter
    c: u64,
    /// Number of results remaining in `r` (counts down from 256)
    n: usize,
    /// Logical draws consumed so far
    call_count: u64,
}

impl RngState {
    /// Logical draws consumed when the snapshot was taken
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    fn validate(&self) -> Result<(), RngError> {
        if self.r.len() != ISAAC64_SZ || self.m.len() != ISAAC64_SZ {
            return Err(RngError::Corrupted("state arrays have the wrong size"));
        }
        if self.n > ISAAC64_SZ {
            return Err(RngError::Corrupted("result index past the buffer"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for RngState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RngState")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("c", &self.c)
            .field("n", &self.n)
            .field("call_count", &self.call_count)
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct StateBlob {
    magic: String,
    version: u32,
    state: RngState,
}

/// ISAAC64 random number generator context
#[derive(Clone)]
pub struct Isaac64 {
    st: RngState,
    /// If true, record all calls into trace log
    tracing: bool,
    /// Trace log (only populated when tracing is true)
    trace: Vec<RngTraceEntry>,
}

impl core::fmt::Debug for Isaac64 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Isaac64")
            .field("state", &self.st)
            .field("tracing", &self.tracing)
            .finish()
    }
}

impl Isaac64 {
    /// Create a new ISAAC64 instance seeded with a u64 value.
    pub fn new(seed: u64) -> Self {
        let mut ctx = Self {
            st: RngState {
                r: vec![0; ISAAC64_SZ],
                m: vec![0; ISAAC64_SZ],
                a: 0,
                b: 0,
                c: 0,
                n: 0,
                call_count: 0,
            },
            tracing: false,
            trace: Vec::new(),
        };
        ctx.seed(seed);
        ctx
    }

    /// Reset the stream to the start of the sequence for `seed`.
    ///
    /// The call counter and the trace are cleared; tracing stays enabled if
    /// it was.
    pub fn seed(&mut self, seed: u64) {
        self.st.a = 0;
        self.st.b = 0;
        self.st.c = 0;
        self.st.call_count = 0;
        self.st.r.iter_mut().for_each(|v| *v = 0);
        self.trace.clear();
        self.reseed(&seed.to_le_bytes());
    }

    /// Rebuild a generator from a snapshot.
    pub fn from_state(state: RngState) -> Result<Self, RngError> {
        state.validate()?;
        Ok(Self {
            st: state,
            tracing: false,
            trace: Vec::new(),
        })
    }

    /// Mix seed bytes into state
    fn reseed(&mut self, seed: &[u8]) {
        let nseed = seed.len().min(ISAAC64_SZ * 8);

        for (i, chunk) in seed[..nseed].chunks(8).enumerate() {
            let mut val = 0u64;
            for (j, byte) in chunk.iter().enumerate() {
                val |= (*byte as u64) << (j * 8);
            }
            self.st.r[i] ^= val;
        }

        // Golden ratio
        let mut x = [0x9E3779B97F4A7C13u64; 8];
        for _ in 0..4 {
            Self::mix(&mut x);
        }

        for i in (0..ISAAC64_SZ).step_by(8) {
            for j in 0..8 {
                x[j] = x[j].wrapping_add(self.st.r[i + j]);
            }
            Self::mix(&mut x);
            self.st.m[i..i + 8].copy_from_slice(&x);
        }

        for i in (0..ISAAC64_SZ).step_by(8) {
            for j in 0..8 {
                x[j] = x[j].wrapping_add(self.st.m[i + j]);
            }
            Self::mix(&mut x);
            self.st.m[i..i + 8].copy_from_slice(&x);
        }

        self.update();
    }

    fn mix(x: &mut [u64; 8]) {
        const SHIFT: [u32; 8] = [9, 9, 23, 15, 14, 20, 17, 14];

        for i in (0..8).step_by(2) {
            x[i] = x[i].wrapping_sub(x[(i + 4) & 7]);
            x[(i + 5) & 7] ^= x[(i + 7) & 7] >> SHIFT[i];
            x[(i + 7) & 7] = x[(i + 7) & 7].wrapping_add(x[i]);

            let i = i + 1;
            x[i] = x[i].wrapping_sub(x[(i + 4) & 7]);
            x[(i + 5) & 7] ^= x[(i + 7) & 7] << SHIFT[i];
            x[(i + 7) & 7] = x[(i + 7) & 7].wrapping_add(x[i]);
        }
    }

    /// Bits 3..3+ISAAC64_SZ_LOG, used as an index
    #[inline]
    fn lower_bits(x: u64) -> usize {
        ((x & (((ISAAC64_SZ - 1) as u64) << 3)) >> 3) as usize
    }

    /// Bits ISAAC64_SZ_LOG+3..2*ISAAC64_SZ_LOG+3, used as an index
    #[inline]
    fn upper_bits(y: u64) -> usize {
        ((y >> (ISAAC64_SZ_LOG + 3)) & ((ISAAC64_SZ - 1) as u64)) as usize
    }

    /// One ISAAC64 round step at index `i` pairing with `partner`
    #[inline]
    fn step(&mut self, i: usize, partner: usize, a: &mut u64, b: &mut u64, mixed: u64) {
        let x = self.st.m[i];
        *a = mixed.wrapping_add(self.st.m[partner]);
        let y = self.st.m[Self::lower_bits(x)].wrapping_add(*a).wrapping_add(*b);
        self.st.m[i] = y;
        *b = self.st.m[Self::upper_bits(y)].wrapping_add(x);
        self.st.r[i] = *b;
    }

    /// Generate 256 new results
    fn update(&mut self) {
        const HALF: usize = ISAAC64_SZ / 2;
        let mut a = self.st.a;
        self.st.c = self.st.c.wrapping_add(1);
        let mut b = self.st.b.wrapping_add(self.st.c);

        for i in (0..ISAAC64_SZ).step_by(4) {
            let partner = if i < HALF { i + HALF } else { i - HALF };
            let mixed = !a ^ (a << 21);
            self.step(i, partner, &mut a, &mut b, mixed);
            let mixed = a ^ (a >> 5);
            self.step(i + 1, partner + 1, &mut a, &mut b, mixed);
            let mixed = a ^ (a << 12);
            self.step(i + 2, partner + 2, &mut a, &mut b, mixed);
            let mixed = a ^ (a >> 33);
            self.step(i + 3, partner + 3, &mut a, &mut b, mixed);
        }

        self.st.b = b;
        self.st.a = a;
        self.st.n = ISAAC64_SZ;
    }

    /// Consume one raw word
    #[inline]
    fn raw(&mut self) -> u64 {
        if self.st.n == 0 {
            self.update();
        }
        self.st.n -= 1;
        self.st.call_count += 1;
        self.st.r[self.st.n]
    }

    /// One bounded logical draw, recorded under `func`
    #[inline]
    #[track_caller]
    fn draw(&mut self, func: &'static str, bound: u32, offset: u32) -> u32 {
        assert!(bound > 0, "{func}({bound}): draw bound must be positive");
        let raw = self.raw();
        let res = (raw % bound as u64) as u32 + offset;
        if self.tracing {
            self.trace.push(RngTraceEntry {
                seq: self.st.call_count - 1,
                func: func.to_string(),
                arg: bound as u64,
                result: res as u64,
                raw,
            });
        }
        res
    }

    /// Get the next raw u64. Counts as one logical draw.
    #[inline]
    pub fn next_raw(&mut self) -> u64 {
        let raw = self.raw();
        if self.tracing {
            self.trace.push(RngTraceEntry {
                seq: self.st.call_count - 1,
                func: "raw".to_string(),
                arg: 0,
                result: raw,
                raw,
            });
        }
        raw
    }

    /// Returns a random value in [0, x)
    ///
    /// # Panics
    /// If `x == 0`.
    #[inline]
    #[track_caller]
    pub fn rn2(&mut self, x: u32) -> u32 {
        self.draw("rn2", x, 0)
    }

    /// Returns a random value in [1, x]
    ///
    /// # Panics
    /// If `x == 0`.
    #[inline]
    #[track_caller]
    pub fn rnd(&mut self, x: u32) -> u32 {
        self.draw("rnd", x, 1)
    }

    /// Returns a random value in [y, y + x)
    #[inline]
    #[track_caller]
    pub fn rn1(&mut self, x: u32, y: u32) -> u32 {
        self.rn2(x) + y
    }

    /// Roll n dice of x sides, summed in draw order
    #[track_caller]
    pub fn d(&mut self, n: u32, x: u32) -> u32 {
        let mut result = 0;
        for _ in 0..n {
            result += self.draw("d", x, 1);
        }
        result
    }

    /// Luck-adjusted random in [0, x)
    #[track_caller]
    pub fn rnl(&mut self, x: u32, luck: i32) -> u32 {
        let mut i = self.rn2(x) as i32;
        let adjustment = if x <= 15 {
            (luck.abs() + 1) / 3 * luck.signum()
        } else {
            luck
        };
        if adjustment != 0 && self.rn2(37 + adjustment.unsigned_abs()) != 0 {
            i -= adjustment;
            if i < 0 {
                i = 0;
            } else if i >= x as i32 {
                i = x as i32 - 1;
            }
        }
        i as u32
    }

    /// Truncated geometric distribution
    #[track_caller]
    pub fn rne(&mut self, x: u32, level: u32) -> u32 {
        let utmp = if level < 15 { 5 } else { level / 3 };
        let mut tmp = 1u32;
        while tmp < utmp && self.rn2(x) == 0 {
            tmp += 1;
        }
        tmp
    }

    /// Log-scale spread around `i`
    pub fn rnz(&mut self, i: i32, level: u32) -> i32 {
        let mut x = i as i64;
        let mut tmp = 1000i64;
        tmp += self.rn2(1000) as i64;
        tmp *= self.rne(4, level) as i64;
        if self.rn2(2) != 0 {
            x = x * tmp / 1000;
        } else {
            x = x * 1000 / tmp;
        }
        x as i32
    }

    /// Capture the full state (buffers, counters and draw counter)
    pub fn snapshot(&self) -> RngState {
        self.st.clone()
    }

    /// Restore a snapshot taken with [`Isaac64::snapshot`].
    ///
    /// Tracing settings are kept; the trace log is left untouched.
    pub fn restore(&mut self, state: &RngState) -> Result<(), RngError> {
        state.validate()?;
        self.st = state.clone();
        Ok(())
    }

    /// Serialize the state into an opaque, versioned blob
    pub fn to_blob(&self) -> Result<Vec<u8>, RngError> {
        let blob = StateBlob {
            magic: BLOB_MAGIC.to_string(),
            version: BLOB_VERSION,
            state: self.st.clone(),
        };
        Ok(serde_json::to_vec(&blob)?)
    }

    /// Rebuild a generator from a blob produced by [`Isaac64::to_blob`]
    pub fn from_blob(bytes: &[u8]) -> Result<Self, RngError> {
        let blob: StateBlob = serde_json::from_slice(bytes)?;
        if blob.magic != BLOB_MAGIC {
            return Err(RngError::BadMagic(blob.magic));
        }
        if blob.version != BLOB_VERSION {
            return Err(RngError::IncompatibleVersion {
                expected: BLOB_VERSION,
                found: blob.version,
            });
        }
        Self::from_state(blob.state)
    }

    /// Enable RNG tracing (clears any previous trace)
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
        self.trace.clear();
    }

    /// Disable RNG tracing
    pub fn disable_tracing(&mut self) {
        self.tracing = false;
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Recorded trace since tracing was enabled
    pub fn trace(&self) -> &[RngTraceEntry] {
        &self.trace
    }

    /// Take the recorded trace, leaving an empty log
    pub fn take_trace(&mut self) -> Vec<RngTraceEntry> {
        core::mem::take(&mut self.trace)
    }

    /// Total number of logical draws
    pub fn call_count(&self) -> u64 {
        self.st.call_count
    }
}

impl Default for Isaac64 {
    fn default() -> Self {
        Self::new(0)
    }
}

impl rand::RngCore for Isaac64 {
    fn next_u32(&mut self) -> u32 {
        self.next_raw() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_raw()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Isaac64::new(42);
        let mut b = Isaac64::new(42);
        for _ in 0..600 {
            assert_eq!(a.rn2(1000), b.rn2(1000));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = Isaac64::new(1);
        let mut b = Isaac64::new(2);
        let sa: Vec<u32> = (0..16).map(|_| a.rn2(1 << 30)).collect();
        let sb: Vec<u32> = (0..16).map(|_| b.rn2(1 << 30)).collect();
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut rng = Isaac64::new(7);
        let first: Vec<u32> = (0..10).map(|_| rng.rn2(100)).collect();
        rng.seed(7);
        assert_eq!(rng.call_count(), 0);
        let again: Vec<u32> = (0..10).map(|_| rng.rn2(100)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_bounds() {
        let mut rng = Isaac64::new(42);
        for _ in 0..1000 {
            assert!(rng.rn2(10) < 10);
            let r = rng.rnd(6);
            assert!((1..=6).contains(&r));
            let r = rng.rn1(5, 10);
            assert!((10..15).contains(&r));
        }
    }

    #[test]
    fn test_dice_is_sum_of_component_draws() {
        let mut a = Isaac64::new(99);
        let mut b = Isaac64::new(99);
        let total = a.d(3, 6);
        let manual = b.rnd(6) + b.rnd(6) + b.rnd(6);
        assert_eq!(total, manual);
        assert_eq!(a.call_count(), 3);
        assert_eq!(a.d(0, 6), 0);
        assert_eq!(a.call_count(), 3);
    }

    #[test]
    #[should_panic(expected = "draw bound must be positive")]
    fn test_rn2_zero_panics() {
        let mut rng = Isaac64::new(1);
        rng.rn2(0);
    }

    #[test]
    #[should_panic(expected = "draw bound must be positive")]
    fn test_rnd_zero_panics() {
        let mut rng = Isaac64::new(1);
        rng.rnd(0);
    }

    #[test]
    fn test_call_count_crosses_refill() {
        let mut rng = Isaac64::new(3);
        for _ in 0..(ISAAC64_SZ * 2 + 5) {
            rng.rn2(2);
        }
        assert_eq!(rng.call_count(), (ISAAC64_SZ * 2 + 5) as u64);
    }

    #[test]
    fn test_snapshot_restore_resumes_exactly() {
        let mut rng = Isaac64::new(1234);
        for _ in 0..300 {
            rng.rn2(17);
        }
        let snap = rng.snapshot();
        let expected: Vec<u32> = (0..400).map(|_| rng.rn2(1000)).collect();
        let expected_count = rng.call_count();

        rng.restore(&snap).unwrap();
        assert_eq!(rng.call_count(), 300);
        let replay: Vec<u32> = (0..400).map(|_| rng.rn2(1000)).collect();
        assert_eq!(expected, replay);
        assert_eq!(rng.call_count(), expected_count);
    }

    #[test]
    fn test_blob_roundtrip() {
        let mut rng = Isaac64::new(555);
        rng.d(4, 8);
        let blob = rng.to_blob().unwrap();
        let mut restored = Isaac64::from_blob(&blob).unwrap();
        assert_eq!(restored.call_count(), 4);
        assert_eq!(rng.rn2(1 << 20), restored.rn2(1 << 20));
    }

    #[test]
    fn test_blob_rejects_garbage() {
        assert!(matches!(
            Isaac64::from_blob(b"not json"),
            Err(RngError::Decode(_))
        ));

        let rng = Isaac64::new(1);
        let text = String::from_utf8(rng.to_blob().unwrap()).unwrap();
        let tampered = text.replace(BLOB_MAGIC, "XXXXXX");
        assert!(matches!(
            Isaac64::from_blob(tampered.as_bytes()),
            Err(RngError::BadMagic(_))
        ));
    }

    #[test]
    fn test_trace_records_each_draw() {
        let mut rng = Isaac64::new(42);
        rng.rn2(5);
        rng.enable_tracing();
        let a = rng.rn2(10);
        let b = rng.rnd(4);
        let c = rng.d(2, 3);
        let trace = rng.trace();

        assert_eq!(trace.len(), 4);
        assert_eq!(trace[0].seq, 1);
        assert_eq!(trace[0].func, "rn2");
        assert_eq!(trace[0].arg, 10);
        assert_eq!(trace[0].result, a as u64);
        assert_eq!(trace[1].func, "rnd");
        assert_eq!(trace[1].result, b as u64);
        assert_eq!(trace[2].func, "d");
        assert_eq!(trace[2].arg, 3);
        assert_eq!(trace[2].result + trace[3].result, c as u64);
    }

    #[test]
    fn test_rngcore_draws_are_counted() {
        use rand::RngCore;
        let mut rng = Isaac64::new(8);
        let mut buf = [0u8; 20];
        rng.fill_bytes(&mut buf);
        assert_eq!(rng.call_count(), 3);
        rng.next_u32();
        assert_eq!(rng.call_count(), 4);
    }
}
