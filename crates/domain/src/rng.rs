//! Seeded pseudo-random streams for procedural generation.
//!
//! Every generated artifact is a pure function of a string seed. Seeds compose
//! hierarchically (`world-3-4`, `world-3-4-dungeon`, `dungeon-seed-z-7`) so each
//! sub-generator can be reproduced on its own.
//!
//! This is reproducibility, not cryptographic quality: a 32-bit linear
//! congruential step with a murmur-style finalizer on the output.

/// Multiplier of the 32-bit LCG step (Numerical Recipes).
const LCG_MULTIPLIER: u32 = 1_664_525;

/// Increment of the 32-bit LCG step.
const LCG_INCREMENT: u32 = 1_013_904_223;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Compose a child seed from a parent seed and a suffix.
pub fn derive_seed(seed: &str, suffix: impl std::fmt::Display) -> String {
    format!("{seed}-{suffix}")
}

/// Hash a seed string into the 32-bit starting state.
pub fn seed_state(seed: &str) -> u32 {
    let hash = seed
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    avalanche(hash)
}

/// The stream contract as a pure function: one step from `state`.
///
/// Returns the value in `[0, 1)` and the state to feed into the next call.
pub fn next(state: u32) -> (f64, u32) {
    let advanced = state
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
    (f64::from(avalanche(advanced)) / TWO_POW_32, advanced)
}

/// 32-bit finalizer (murmur3 fmix32). Spreads single-bit seed differences.
#[inline]
fn avalanche(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// A deterministic stream of values derived from a seed string.
///
/// The only state is the current 32-bit LCG state; cloning a stream forks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicRng {
    state: u32,
}

impl DeterministicRng {
    pub fn new(seed: &str) -> Self {
        Self {
            state: seed_state(seed),
        }
    }

    /// Stream for a child seed (`seed-suffix`).
    pub fn derive(seed: &str, suffix: impl std::fmt::Display) -> Self {
        Self::new(&derive_seed(seed, suffix))
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let (value, state) = next(self.state);
        self.state = state;
        value
    }

    /// Next integer in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let scaled = (self.next_f64() * f64::from(bound)) as u32;
        scaled.min(bound - 1)
    }

    /// Next integer in `[min, max]`.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        min + self.next_below(max - min + 1)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
        items.get(self.next_below(len) as usize)
    }
}
