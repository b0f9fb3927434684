//! Deterministic random number generation.
//!
//! RULE: Nothing in the core may call a platform RNG.
//! The only consumer is the display-only projection used when no
//! parameters exist yet; it is seeded so two runs with the same seed
//! draw the same jitter.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Mixed into the caller's seed so unrelated seeds do not share prefixes.
const STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct ProjectionRng {
    inner: Pcg64Mcg,
}

impl ProjectionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed ^ STREAM_SALT),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform draw in [low, low + width).
    pub fn jitter(&mut self, low: f64, width: f64) -> f64 {
        low + self.next_f64() * width
    }
}
