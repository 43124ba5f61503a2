//! Software model of the squaring unit.
//!
//! Runs the same chain the hardware runs and moves operands through the same
//! wire layout, so host-side marshalling bugs show up here before a card is
//! ever programmed. The cycle counter assumes the pipelined design's rate of
//! one modular squaring retired per clock.

use std::path::Path;

use num_bigint::BigUint;
use num_traits::One;

use crate::align::AlignedWords;
use crate::geometry::Geometry;
use crate::{tables, words, Device, Error, Job, JobOutput, Result};

const CYCLES_PER_SQUARE: u64 = 1;

pub struct Simulator {
    geometry: Geometry,
    modulus: BigUint,
    input_buf: AlignedWords,
    output_buf: AlignedWords,
    initialized: bool,
    tables_loaded: bool,
    table_bytes: usize,
    cycle_count: u64,
    quiet: bool,
}

impl Simulator {
    pub fn new(geometry: Geometry, modulus: BigUint) -> Result<Self> {
        if modulus <= BigUint::one() {
            return Err(Error::Config("modulus must be at least 2".to_string()));
        }
        if modulus.bits() > geometry.capacity_bits() {
            return Err(Error::Config(format!(
                "{}-bit modulus exceeds the {}-bit geometry",
                modulus.bits(),
                geometry.capacity_bits()
            )));
        }
        Ok(Self {
            geometry,
            modulus,
            input_buf: AlignedWords::zeroed(0),
            output_buf: AlignedWords::zeroed(0),
            initialized: false,
            tables_loaded: false,
            table_bytes: 0,
            cycle_count: 0,
            quiet: false,
        })
    }

    /// Clocks consumed since construction or the last `reset`.
    pub fn cycles(&self) -> u64 {
        self.cycle_count
    }
}

impl Device for Simulator {
    fn reset(&mut self) -> Result<()> {
        self.cycle_count = 0;
        self.input_buf.fill(0);
        self.output_buf.fill(0);
        Ok(())
    }

    fn init(&mut self, words_in: usize, words_out: usize) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        if words_in != self.geometry.words_in() {
            return Err(Error::WordCountMismatch {
                host: words_in,
                device: self.geometry.words_in(),
            });
        }
        if words_out != self.geometry.words_out() {
            return Err(Error::WordCountMismatch {
                host: words_out,
                device: self.geometry.words_out(),
            });
        }
        self.input_buf = AlignedWords::zeroed(words_in);
        self.output_buf = AlignedWords::zeroed(words_out);
        self.initialized = true;
        Ok(())
    }

    fn load_reduction_tables(&mut self, dir: &Path) -> Result<()> {
        // num_urams == 0 means the tables shipped inside the bitstream.
        if self.geometry.num_urams > 0 {
            let banks = tables::load(dir, self.geometry.num_urams)?;
            self.table_bytes = banks.iter().map(Vec::len).sum();
            if !self.quiet {
                println!(
                    "Loaded {} reduction table banks ({} bytes)",
                    banks.len(),
                    self.table_bytes
                );
            }
        }
        self.tables_loaded = true;
        Ok(())
    }

    fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    fn compute_job(&mut self, job: &Job) -> Result<JobOutput> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if self.geometry.num_urams > 0 && !self.tables_loaded {
            return Err(Error::TablesNotLoaded);
        }

        self.input_buf
            .copy_from_slice(&words::pack_job(job, &self.geometry)?);

        // Model the device strictly from its input memory.
        let (t_start, t_final, mut sq) = words::unpack_job(&self.input_buf, &self.geometry)?;
        if job.emulate {
            // Emulation checks values only; no cycle accounting.
            let exponent = BigUint::one() << (t_final - t_start);
            sq = sq.modpow(&exponent, &self.modulus);
        } else {
            for _ in t_start..t_final {
                sq = &sq * &sq % &self.modulus;
                self.cycle_count += CYCLES_PER_SQUARE;
            }
        }

        self.output_buf
            .copy_from_slice(&words::pack_output(&sq, t_final, &self.geometry)?);
        words::unpack_output(&self.output_buf, &self.geometry)
    }
}
