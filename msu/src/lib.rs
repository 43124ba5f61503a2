//! Host-side application for an FPGA modular squaring unit.
//!
//! Evaluates a verifiable-delay chain `x_{i+1} = x_i^2 mod N` on whichever
//! backend the build selects: a real accelerator card (feature `hw`) or the
//! software model of the same design.
//!
//! Steps:
//! - bring the device up once (`init`, `reset`, reduction tables)
//! - dispatch squaring jobs of at most one checkpoint interval each
//! - check every result against a bignum reference, roll it into the next job
//!
//! The device computes as fast as the silicon allows; the host only
//! marshals operands, keeps time, and counts mismatches. A mismatch is a
//! result, not an exception: it becomes the process exit code.

pub mod config;
pub use config::RunConfig;

pub mod msu;
pub use msu::{ActiveDevice, JobOutcome, Msu, RunSummary, Telemetry};

pub mod rng;
pub use rng::StartSource;

pub mod testing;

pub mod timing;

pub use fpga::{Device, Error, Geometry, Job, JobOutput, Result};

/// Device constructor, independent of the "hw" feature.
#[cfg(feature = "hw")]
pub fn device(config: &RunConfig) -> Result<ActiveDevice> {
    ActiveDevice::new(config.geometry, &config.xclbin)
}
#[cfg(not(feature = "hw"))]
pub fn device(config: &RunConfig) -> Result<ActiveDevice> {
    ActiveDevice::new(config.geometry, config.modulus.clone())
}
