//! Null device: every call succeeds, every result is zero.
//!
//! Useful for exercising host-side plumbing without hardware, and for
//! forcing result mismatches on demand.

use std::path::Path;

use num_traits::Zero;

use crate::{Device, Job, JobOutput, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl Device for Null {
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn init(&mut self, _words_in: usize, _words_out: usize) -> Result<()> {
        Ok(())
    }

    fn load_reduction_tables(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn set_quiet(&mut self, _quiet: bool) {}

    fn compute_job(&mut self, job: &Job) -> Result<JobOutput> {
        Ok(JobOutput {
            sq_out: Zero::zero(),
            t_curr: job.t_final,
        })
    }
}
