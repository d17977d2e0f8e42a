//! Seeded random draws for the simulation.
//!
//! Every replication owns one `Variates` stream. The dispatcher's uniform draw and
//! the queue's exponential draws all come from that stream, so two runs with the
//! same seed see the same numbers in the same order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::OpenClosed01;

#[derive(Debug, Clone)]
pub struct Variates {
    rng: StdRng,
}

impl Variates {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Exponentially distributed sample with the given rate.
    ///
    /// Uses `-ln(x) / rate` with `x` drawn from `(0, 1]`. Zero is excluded from the
    /// draw so `ln(0)` can never happen.
    ///
    /// # Panics
    ///
    /// Panics if rate is not positive and finite. Configuration validation rules
    /// this out before a simulation starts.
    pub fn sample(&mut self, rate: f64) -> f64 {
        assert!(rate > 0.0 && rate.is_finite(), "Rate must be positive, got {rate}");

        let x: f64 = self.rng.sample(OpenClosed01);
        -x.ln() / rate
    }

    /// Uniform draw from `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// FNV-1a over 64-bit words.
const fn fnv1a64_words(words: &[u64]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    let mut w = 0;
    while w < words.len() {
        let bytes = words[w].to_le_bytes();
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x100000001b3);
            i += 1;
        }
        w += 1;
    }
    hash
}

/// Seed for one replication's independent stream.
///
/// Depends only on the experiment seed and the replication's coordinates, never on
/// execution order, so replications can run in any order or in parallel.
pub const fn substream_seed(seed: u64, point: u64, replication: u64) -> u64 {
    fnv1a64_words(&[seed, point, replication])
}
