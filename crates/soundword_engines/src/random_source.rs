#![forbid(unsafe_code)]

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use soundword_kernel_contracts::ContractViolation;

/// The single seeded generator behind every random draw of a session's design.
///
/// ChaCha8 output is specified independently of platform and `rand` internals, so a plan is a
/// pure function of (seed, catalog, parameters). One instance per session; never shared.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Weighted coin flip with P(true) = `p`.
    pub fn bernoulli(&mut self, p: f64) -> Result<bool, ContractViolation> {
        if !p.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "random_source.p",
            });
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(ContractViolation::InvalidRange {
                field: "random_source.p",
                min: 0.0,
                max: 1.0,
                got: p,
            });
        }
        Ok(self.rng.gen_bool(p))
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Uniform permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut out: Vec<usize> = (0..n).collect();
        self.shuffle(&mut out);
        out
    }
}
