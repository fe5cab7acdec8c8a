//! Seedable uniform random source.
//!
//! Every component that needs randomness takes a `&mut RandomSource` (or owns
//! one). Reseeding is an explicit call, so the points where a sequence restarts
//! are visible at the call site.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: StdRng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed the current sequence started from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Uniform integer in `[low, high)`.
    pub fn range(&mut self, low: i32, high: i32) -> Result<i32> {
        if low >= high {
            return Err(Error::InvalidRange { low, high });
        }
        Ok(self.rng.gen_range(low..high))
    }

    /// Uniform float in `[-1, 1]`.
    pub fn noise(&mut self) -> f32 {
        self.rng.gen_range(-1.0_f32..=1.0)
    }
}
