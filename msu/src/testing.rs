//! Generate test instances.

use fpga::{Geometry, Simulator};
use num_bigint::BigUint;

use crate::config::{parse_modulus, DEFAULT_MODULUS};
use crate::msu::Msu;
use crate::rng::StartSource;

/// 8-bit words, two payload words, mod 101: big enough to be interesting,
/// small enough to check by hand.
pub fn small_geometry() -> Geometry {
    Geometry::new(8, 2, 1, 0).unwrap()
}

pub fn small_modulus() -> BigUint {
    BigUint::from(101u32)
}

/// Simulator-backed orchestrator over the hand-checkable modulus.
pub fn msu_mod_101() -> Msu<Simulator> {
    let geometry = small_geometry();
    let modulus = small_modulus();
    let sim = Simulator::new(geometry, modulus.clone()).unwrap();
    Msu::new(sim, modulus, geometry, true).unwrap()
}

/// Simulator-backed orchestrator over the reference 128-bit modulus.
pub fn msu_default() -> Msu<Simulator> {
    let geometry = Geometry::default();
    let modulus = parse_modulus(DEFAULT_MODULUS).unwrap();
    let sim = Simulator::new(geometry, modulus.clone()).unwrap();
    Msu::new(sim, modulus, geometry, true).unwrap()
}

pub fn random_starts(count: usize, seed: u64, modulus: &BigUint) -> Vec<BigUint> {
    let mut source = StartSource::new(false, Some(seed));
    (0..count).map(|_| source.draw(modulus)).collect()
}
