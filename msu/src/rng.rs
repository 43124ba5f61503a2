//! Random starting values.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::prelude::StdRng;
use rand::Rng;
use rand_core::SeedableRng;

/// Where a run's starting values come from in random mode.
pub struct StartSource {
    rng: StdRng,
    rrandom: bool,
}

impl StartSource {
    /// Seeded sources replay the same draws; unseeded ones pull entropy.
    pub fn new(rrandom: bool, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, rrandom }
    }

    /// Draw a starting value in `[0, modulus)`.
    pub fn draw(&mut self, modulus: &BigUint) -> BigUint {
        if self.rrandom {
            rrandom_bits(&mut self.rng, modulus.bits()) % modulus
        } else {
            self.rng.gen_biguint_below(modulus)
        }
    }
}

/// Stress values in the libgmp `rrandomb` tradition: alternating runs of set
/// and clear bits. These reach carry-chain corners that uniform draws almost
/// never hit.
pub fn rrandom_bits(rng: &mut StdRng, bits: u64) -> BigUint {
    let mut value = BigUint::zero();
    let mut remaining = bits;
    let mut ones = rng.gen::<bool>();
    while remaining > 0 {
        let run = rng.gen_range(1..=remaining.min(32));
        value <<= run;
        if ones {
            value += (BigUint::one() << run) - 1u32;
        }
        remaining -= run;
        ones = !ones;
    }
    value
}
