//! Deterministic run-level RNG wrapper.
//!
//! The only randomness in a monitoring run is route selection for injected
//! vehicles.  The type decision (AV vs. conventional) is deliberately *not*
//! random; see `mt_population::MixPolicy`.  A single `SimRng` seeded from the
//! configuration therefore makes a whole run reproducible against a
//! deterministic simulator.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulation-level RNG for route selection and other global draws.
///
/// Used only from the single-threaded monitoring loop.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
