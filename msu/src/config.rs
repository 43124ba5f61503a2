//! Run parameters and CLI-string parsing.

use std::path::PathBuf;

use fpga::{Error, Geometry, Result};
use num_bigint::BigUint;

/// 128-bit test modulus the reference design was built against.
pub const DEFAULT_MODULUS: &str = "302934307671667531413257853548643485645";

pub const DEFAULT_TABLE_DIR: &str = "./mem";

pub const DEFAULT_XCLBIN: &str = "vdf.xclbin";

/// Modulus strings are decimal.
pub fn parse_modulus(s: &str) -> Result<BigUint> {
    let n = BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| Error::Config(format!("invalid modulus {s:?}, expected decimal")))?;
    if n < BigUint::from(2u32) {
        return Err(Error::Config("modulus must be at least 2".to_string()));
    }
    Ok(n)
}

/// Start values are hex, with or without a leading `0x`.
pub fn parse_start(s: &str) -> Result<BigUint> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| Error::Config(format!("invalid start value {s:?}, expected hex")))
}

/// Everything one run needs, CLI already digested.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub modulus: BigUint,
    pub geometry: Geometry,
    /// Fixed starting value; `None` selects random mode.
    pub start: Option<BigUint>,
    /// Target squaring count per test iteration.
    pub t_final: u64,
    /// Squarings per device dispatch; 0 means one uninterrupted job.
    pub interval: u64,
    pub test_iterations: u64,
    /// Draw stress-pattern starts (long runs of 0 and 1 bits) instead of
    /// uniform ones.
    pub rrandom: bool,
    /// Seed for reproducible random starts; `None` draws from entropy.
    pub seed: Option<u64>,
    pub emulate: bool,
    pub quiet: bool,
    pub table_dir: PathBuf,
    pub xclbin: PathBuf,
}

impl RunConfig {
    /// A single whole-range job over `modulus`, everything else at the
    /// defaults the reference host shipped with.
    pub fn new(modulus: BigUint, geometry: Geometry) -> Self {
        Self {
            modulus,
            geometry,
            start: None,
            t_final: 1,
            interval: 0,
            test_iterations: 1,
            rrandom: false,
            seed: None,
            emulate: false,
            quiet: false,
            table_dir: PathBuf::from(DEFAULT_TABLE_DIR),
            xclbin: PathBuf::from(DEFAULT_XCLBIN),
        }
    }

    pub fn effective_interval(&self) -> u64 {
        if self.interval == 0 {
            self.t_final
        } else {
            self.interval
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.modulus.bits() > self.geometry.capacity_bits() {
            return Err(Error::Config(format!(
                "{}-bit modulus exceeds the {}-bit word geometry",
                self.modulus.bits(),
                self.geometry.capacity_bits()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_modulus_parses_to_128_bits() {
        let n = parse_modulus(DEFAULT_MODULUS).unwrap();
        assert_eq!(n.bits(), 128);
    }

    #[test]
    fn modulus_must_be_decimal_and_nontrivial() {
        assert!(parse_modulus("0xff").is_err());
        assert!(parse_modulus("banana").is_err());
        assert!(parse_modulus("1").is_err());
        assert!(parse_modulus("0").is_err());
    }

    #[test]
    fn start_accepts_hex_with_or_without_prefix() {
        assert_eq!(parse_start("0xff").unwrap(), BigUint::from(255u32));
        assert_eq!(parse_start("0XFF").unwrap(), BigUint::from(255u32));
        assert_eq!(parse_start("ff").unwrap(), BigUint::from(255u32));
        assert!(parse_start("0xzz").is_err());
        assert!(parse_start("").is_err());
    }

    #[test]
    fn zero_interval_means_one_job() {
        let mut config = RunConfig::new(BigUint::from(101u32), Geometry::default());
        config.t_final = 10;
        assert_eq!(config.effective_interval(), 10);
        config.interval = 3;
        assert_eq!(config.effective_interval(), 3);
    }

    #[test]
    fn validate_rejects_modulus_wider_than_geometry() {
        let g = Geometry::new(8, 2, 1, 0).unwrap();
        let config = RunConfig::new(BigUint::from(1u32) << 20, g);
        assert!(config.validate().is_err());
        let config = RunConfig::new(BigUint::from(65521u32), g);
        assert!(config.validate().is_ok());
    }
}
