//! random.rs — Pluggable uniform random source
//!
//! Every draw in the frame synthesizer and the vitals engine goes through
//! [`UniformSource`], so a fixed sequence reproduces a tick exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// Source of uniform floats in `[0, 1)`.
pub trait UniformSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform in `[-amplitude/2, amplitude/2)`.
    fn centered(&mut self, amplitude: f64) -> f64 {
        (self.next_f64() - 0.5) * amplitude
    }

    /// Bernoulli draw: true with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a non-empty slice.
    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        let idx = (self.next_f64() * items.len() as f64) as usize;
        items[idx.min(items.len() - 1)]
    }
}

/// `UniformSource` backed by any `rand` generator.
pub struct RngSource<R: Rng> {
    rng: R,
    unit: Uniform<f64>,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, unit: Uniform::new(0.0, 1.0) }
    }
}

impl RngSource<StdRng> {
    /// Reproducible source for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.unit.sample(&mut self.rng)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    pos: usize,
}

impl FixedSequence {
    /// Values are clamped into `[0, 1)`; an empty list replays `0.5`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() {
            vec![0.5]
        } else {
            values.into_iter().map(|v| v.clamp(0.0, 0.999_999_999)).collect()
        };
        Self { values, pos: 0 }
    }

    /// A source that always returns `v`.
    pub fn constant(v: f64) -> Self {
        Self::new(vec![v])
    }
}

impl UniformSource for FixedSequence {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}
