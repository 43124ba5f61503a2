//! # msu-fpga
//!
//! Device abstraction for a modular squaring unit (MSU): hardware that
//! evaluates a verifiable-delay chain `x_{i+1} = x_i^2 mod N` as fast as the
//! silicon allows, with the host only marshalling operands and counting.
//!
//! Backends:
//! - [`SdAccel`]: an OpenCL-programmed accelerator card (feature `sdaccel`),
//! - [`Simulator`]: a cycle-counting software model of the same design,
//! - [`Null`]: a mock that swallows writes and returns zeroes.

use std::io;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use thiserror::Error;

pub mod align;
pub use align::AlignedWords;

pub mod geometry;
pub use geometry::Geometry;

pub mod null;
pub use null::Null;

#[cfg(feature = "sdaccel")]
pub mod sdaccel;
#[cfg(feature = "sdaccel")]
pub use sdaccel::SdAccel;

pub mod sim;
pub use sim::Simulator;

pub mod tables;

pub mod words;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected parameters or malformed input.
    #[error("configuration: {0}")]
    Config(String),

    /// Operand does not fit the nonredundant words of the geometry.
    #[error("operand exceeds the {bits}-bit nonredundant capacity")]
    OperandTooLarge { bits: u64 },

    /// A reduction table file is missing or unreadable. Fatal; not retried.
    #[error("reduction table {path}: {source}")]
    ReductionTable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("device used before init")]
    NotInitialized,

    #[error("device init called twice")]
    AlreadyInitialized,

    /// Host and device disagree on a buffer word count.
    #[error("word count mismatch: host asked for {host}, device built for {device}")]
    WordCountMismatch { host: usize, device: usize },

    #[error("compute_job before load_reduction_tables")]
    TablesNotLoaded,

    /// Failure reported by the OpenCL runtime. Fatal; not retried.
    #[error("opencl: {0}")]
    OpenCl(String),
}

pub type Result<T> = core::result::Result<T, Error>;

/// One squaring-chain dispatch: `sq_in^(2^(t_final - t_start)) mod N`.
///
/// Ephemeral; built per `compute_job` call and not retained by the device.
#[derive(Clone, Debug)]
pub struct Job {
    pub sq_in: BigUint,
    pub t_start: u64,
    pub t_final: u64,
    /// Emulation runs skip timing fidelity; the value is still exact.
    pub emulate: bool,
}

/// Raw device output: still in the redundant range, not yet reduced mod N.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutput {
    pub sq_out: BigUint,
    /// Iteration counter reported back by the device; `t_final` on success.
    pub t_curr: u64,
}

/// Capability contract every MSU backend satisfies.
///
/// Lifecycle: `init` exactly once, then `reset`, `load_reduction_tables` and
/// `compute_job` in any sensible order. `compute_job` blocks until its result
/// is valid; backends may pipeline internally but the call boundary is
/// synchronous. Result mismatches are the orchestrator's business; a backend
/// errors only on device faults.
pub trait Device {
    /// Return the device to a known idle state. Idempotent, and callable
    /// before `init`.
    fn reset(&mut self) -> Result<()>;

    /// Allocate host buffers for `words_in`/`words_out` 32-bit words and
    /// prepare device-side resources. The counts are checked against the
    /// geometry the backend was built for.
    fn init(&mut self, words_in: usize, words_out: usize) -> Result<()>;

    /// Read the reduction tables under `dir` and push their raw bytes to
    /// device memory. Immutable for the rest of the process lifetime.
    fn load_reduction_tables(&mut self, dir: &Path) -> Result<()>;

    /// Suppress informational output. Correctness is unaffected.
    fn set_quiet(&mut self, quiet: bool);

    /// Run one squaring job to completion and return the raw output.
    fn compute_job(&mut self, job: &Job) -> Result<JobOutput>;
}
