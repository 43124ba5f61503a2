//! The orchestrator: dispatches squaring jobs, checks every result against a
//! bignum reference, and rolls each checkpoint's output into the next job.

use std::path::Path;
use std::time::{Duration, Instant};

use fpga::{Device, Error, Geometry, Job, Result};
use num_bigint::BigUint;
use num_traits::One;

use crate::config::RunConfig;
use crate::rng::StartSource;

#[cfg(feature = "hw")]
pub use fpga::SdAccel as ActiveDevice;
#[cfg(not(feature = "hw"))]
pub use fpga::Simulator as ActiveDevice;

/// Cumulative run counters. Never reset mid-run.
#[derive(Clone, Debug, Default)]
pub struct Telemetry {
    pub compute: Duration,
    pub jobs: u64,
    pub squarings: u64,
    pub failures: u64,
}

/// One device dispatch, checked.
#[derive(Clone, Debug)]
pub struct JobOutcome {
    /// Device result brought back to canonical form in `[0, N)`.
    pub reduced: BigUint,
    pub elapsed: Duration,
    /// Device result disagreed with the reference. A data result, not an
    /// error: the caller decides to halt.
    pub mismatch: bool,
}

/// Summary of a whole run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub failures: u64,
    /// Final reduced value, if any job ran.
    pub last: Option<BigUint>,
}

pub struct Msu<D> {
    pub device: D,
    pub telemetry: Telemetry,
    modulus: BigUint,
    quiet: bool,
}

impl<D: Device> Msu<D> {
    /// Bring the device up for `geometry` and `modulus`. Init happens here,
    /// exactly once per device.
    pub fn new(mut device: D, modulus: BigUint, geometry: Geometry, quiet: bool) -> Result<Self> {
        if modulus.bits() > geometry.capacity_bits() {
            return Err(Error::Config(format!(
                "{}-bit modulus exceeds the {}-bit word geometry",
                modulus.bits(),
                geometry.capacity_bits()
            )));
        }
        device.set_quiet(quiet);
        device.init(geometry.words_in(), geometry.words_out())?;
        device.reset()?;
        Ok(Self {
            device,
            telemetry: Telemetry::default(),
            modulus,
            quiet,
        })
    }

    pub fn load_reduction_tables(&mut self, dir: &Path) -> Result<()> {
        self.device.load_reduction_tables(dir)
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Reference value `sq_in^(2^iterations) mod N`, computed in software.
    /// Costs the same `iterations` squarings the device spends; that is the
    /// point of a delay function.
    pub fn expected(&self, sq_in: &BigUint, iterations: u64) -> BigUint {
        let exponent = BigUint::one() << iterations;
        sq_in.modpow(&exponent, &self.modulus)
    }

    /// Dispatch one job of `iterations` squarings and check the result.
    pub fn run_job(&mut self, sq_in: &BigUint, iterations: u64, emulate: bool) -> Result<JobOutcome> {
        let sq_in = sq_in % &self.modulus;
        if !self.quiet {
            println!("Running {} squarings from 0x{:x}", iterations, sq_in);
        }
        let job = Job {
            sq_in: sq_in.clone(),
            t_start: 0,
            t_final: iterations,
            emulate,
        };

        let started = Instant::now();
        let output = self.device.compute_job(&job)?;
        let elapsed = started.elapsed();

        let reduced = &output.sq_out % &self.modulus;
        let expected = self.expected(&sq_in, iterations);
        let mismatch = reduced != expected || output.t_curr != iterations;
        if mismatch {
            println!("MISMATCH after {} squarings of 0x{:x}", iterations, sq_in);
            println!("  expected 0x{expected:x}");
            println!("  actual   0x{reduced:x} (t_curr {})", output.t_curr);
        }

        self.telemetry.compute += elapsed;
        self.telemetry.jobs += 1;
        self.telemetry.squarings += iterations;
        if mismatch {
            self.telemetry.failures += 1;
        }
        Ok(JobOutcome {
            reduced,
            elapsed,
            mismatch,
        })
    }

    /// The whole run: `test_iterations` passes of 0 to `t_final` squarings in
    /// checkpoint-interval steps, each step seeded by the previous step's
    /// reduced output. The first step without a fixed start draws randomly;
    /// after that the chain never re-randomizes. A mismatch aborts
    /// everything, and the accumulated count is the caller's exit status.
    pub fn run(&mut self, config: &RunConfig) -> Result<RunSummary> {
        let interval = config.effective_interval();
        let mut source = StartSource::new(config.rrandom, config.seed);
        let mut carried = config.start.clone();
        let mut failures = 0u64;
        let mut last = None;

        for _test in 0..config.test_iterations {
            let mut iter = 0u64;
            while iter < config.t_final {
                let len = interval.min(config.t_final - iter);
                let sq_in = match carried.take() {
                    Some(value) => value,
                    None => source.draw(&self.modulus),
                };

                let outcome = self.run_job(&sq_in, len, config.emulate)?;
                if outcome.mismatch {
                    failures += 1;
                }
                iter += interval;
                carried = Some(outcome.reduced.clone());
                last = Some(outcome.reduced.clone());

                println!();
                if failures > 0 {
                    return Ok(RunSummary { failures, last });
                }
                if !config.emulate {
                    let ns_per_sq = outcome.elapsed.as_nanos() as f64 / len as f64;
                    println!("{iter} {ns_per_sq:.1} ns/sq: {}", outcome.reduced);
                }
            }
        }

        if failures == 0 && config.emulate {
            println!(
                "\nPASSED {} iterations",
                config.test_iterations * config.t_final
            );
        }
        Ok(RunSummary { failures, last })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use fpga::{Null, Simulator};

    fn small_geometry() -> Geometry {
        Geometry::new(8, 2, 1, 0).unwrap()
    }

    fn sim_msu() -> Msu<Simulator> {
        let g = small_geometry();
        let modulus = BigUint::from(101u32);
        let sim = Simulator::new(g, modulus.clone()).unwrap();
        Msu::new(sim, modulus, g, true).unwrap()
    }

    #[test]
    fn job_of_three_squarings_checks_out() {
        let mut msu = sim_msu();
        let outcome = msu.run_job(&BigUint::from(2u32), 3, false).unwrap();
        assert!(!outcome.mismatch);
        assert_eq!(outcome.reduced, BigUint::from(54u32));
        assert_eq!(msu.telemetry.jobs, 1);
        assert_eq!(msu.telemetry.squarings, 3);
        assert_eq!(msu.telemetry.failures, 0);
    }

    #[test]
    fn oversized_input_is_reduced_before_dispatch() {
        let mut msu = sim_msu();
        // 103 = 2 (mod 101), so both jobs land on the same chain.
        let a = msu.run_job(&BigUint::from(103u32), 3, false).unwrap();
        let b = msu.run_job(&BigUint::from(2u32), 3, false).unwrap();
        assert_eq!(a.reduced, b.reduced);
        assert!(!a.mismatch);
    }

    #[test]
    fn null_device_trips_the_reference_check() {
        let g = small_geometry();
        let mut msu = Msu::new(Null, BigUint::from(101u32), g, true).unwrap();
        let outcome = msu.run_job(&BigUint::from(2u32), 3, false).unwrap();
        assert!(outcome.mismatch);
        assert_eq!(msu.telemetry.failures, 1);
    }

    #[test]
    fn modulus_wider_than_geometry_is_rejected() {
        let g = small_geometry();
        let sim = Simulator::new(g, BigUint::from(101u32)).unwrap();
        assert!(Msu::new(sim, BigUint::from(1u32) << 20, g, true).is_err());
    }

    #[test]
    fn zero_iteration_job_hands_back_the_input() {
        let mut msu = sim_msu();
        let outcome = msu.run_job(&BigUint::from(29u32), 0, false).unwrap();
        assert!(!outcome.mismatch);
        assert_eq!(outcome.reduced, BigUint::from(29u32));
    }

    #[test]
    fn expected_matches_iterated_squaring() {
        let msu = sim_msu();
        let mut x = BigUint::from(7u32);
        for _ in 0..20 {
            x = &x * &x % msu.modulus();
        }
        assert_eq!(msu.expected(&BigUint::from(7u32), 20), x);
    }
}
