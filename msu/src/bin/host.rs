use std::path::PathBuf;
use std::process;

use argh::FromArgs;

use msu_host::config::{self, RunConfig};
use msu_host::timing::timed;
use msu_host::{device, Geometry, Msu, Result};

#[derive(FromArgs)]
/// Drive a modular squaring unit: x -> x^2 mod N, repeated.
struct Args {
    /// modulus N, decimal
    #[argh(option, short = 'm', default = "config::DEFAULT_MODULUS.to_string()")]
    modulus: String,

    /// starting value, hex (default random)
    #[argh(option, short = 's')]
    start: Option<String>,

    /// target squaring count per test iteration
    #[argh(option, short = 'f', default = "1")]
    t_final: u64,

    /// squarings per intermediate checkpoint (default: t-final)
    #[argh(option, short = 't', default = "0")]
    interval: u64,

    /// number of test iterations to run
    #[argh(option, short = 'i', default = "1")]
    test_iterations: u64,

    /// word length in bits
    #[argh(option, short = 'w', default = "16")]
    word_len: u32,

    /// number of redundant elements
    #[argh(option, short = 'r', default = "2")]
    redundant: usize,

    /// number of nonredundant elements
    #[argh(option, short = 'n', default = "8")]
    nonredundant: usize,

    /// number of urams holding reduction tables
    #[argh(option, short = 'u', default = "0")]
    urams: usize,

    /// path to reduction table .dat files
    #[argh(option, short = 'd', default = "config::DEFAULT_TABLE_DIR.to_string()")]
    table_dir: String,

    /// path to the device binary (hw builds)
    #[argh(option, default = "config::DEFAULT_XCLBIN.to_string()")]
    xclbin: String,

    /// draw stress-pattern starts (runs of 0/1 bits) instead of uniform
    #[argh(switch)]
    rrandom: bool,

    /// seed random starts for reproducibility
    #[argh(option)]
    seed: Option<u64>,

    /// hardware emulation mode: check values, skip timing
    #[argh(switch, short = 'e')]
    emulate: bool,

    /// quiet
    #[argh(switch, short = 'q')]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let modulus = config::parse_modulus(&self.modulus)?;
        let start = self.start.as_deref().map(config::parse_start).transpose()?;
        let geometry = Geometry::new(self.word_len, self.nonredundant, self.redundant, self.urams)?;

        let mut config = RunConfig::new(modulus, geometry);
        config.start = start;
        config.t_final = self.t_final;
        config.interval = self.interval;
        config.test_iterations = self.test_iterations;
        config.rrandom = self.rrandom;
        config.seed = self.seed;
        config.emulate = self.emulate;
        config.quiet = self.quiet;
        config.table_dir = PathBuf::from(self.table_dir);
        config.xclbin = PathBuf::from(self.xclbin);
        config.validate()?;
        Ok(config)
    }
}

fn run(args: Args) -> Result<u64> {
    let config = args.into_config()?;

    if config.rrandom {
        println!("Enabling rrandom testing");
    }
    if config.emulate {
        println!("Enabling hardware emulation mode");
    }

    let mut msu = timed("device bring-up", || -> Result<_> {
        let device = device(&config)?;
        Msu::new(device, config.modulus.clone(), config.geometry, config.quiet)
    })?;
    timed("loading reduction tables", || {
        msu.load_reduction_tables(&config.table_dir)
    })?;

    let summary = msu.run(&config)?;
    Ok(summary.failures)
}

fn main() {
    let args: Args = argh::from_env();
    match run(args) {
        // The failure count is the exit status; zero means every job checked out.
        Ok(failures) => process::exit(failures as i32),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
