use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use flakepool::PoolConfig;

/// Runtime configuration for the `flakepool-loadgen` binary.
///
/// All values are parsed from CLI arguments or environment variables, so the
/// same binary can be pointed at different pool sizes and consumer counts
/// without rebuilding.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakepool-loadgen",
    version,
    about = "Drives a pre-generated identifier pool from concurrent consumers"
)]
pub struct CliArgs {
    /// Requested buffer capacity of the pool.
    ///
    /// Clamped by the pool to between 100 000 and 1 000 000 identifiers.
    ///
    /// Environment variable: `CAPACITY`
    #[arg(long, env = "CAPACITY", default_value_t = 100_000)]
    pub capacity: usize,

    /// Number of pool workers refilling the buffer.
    ///
    /// Defaults to one worker per available hardware thread.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long = "workers", env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Number of consumer threads calling `acquire()` in a tight loop.
    ///
    /// Environment variable: `NUM_CONSUMERS`
    #[arg(long = "consumers", env = "NUM_CONSUMERS", default_value_t = 4)]
    pub num_consumers: usize,

    /// How long to run before shutting the pool down.
    ///
    /// Environment variable: `DURATION_SECS`
    #[arg(long, env = "DURATION_SECS", default_value_t = 10)]
    pub duration_secs: u64,

    /// How long an idle worker waits for a wake token, in milliseconds.
    ///
    /// Environment variable: `WAIT_TIMEOUT_MS`
    #[arg(long, env = "WAIT_TIMEOUT_MS", default_value_t = 300)]
    pub wait_timeout_ms: u64,

    /// Keep every served identifier and check them for duplicates at the end.
    ///
    /// Memory grows with the number of identifiers served.
    ///
    /// Environment variable: `VERIFY`
    #[arg(long, env = "VERIFY", default_value_t = false)]
    pub verify: bool,
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub pool: PoolConfig,
    pub num_consumers: usize,
    pub duration: Duration,
    pub verify: bool,
}

impl TryFrom<CliArgs> for LoadConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_consumers == 0 {
            bail!("NUM_CONSUMERS must be greater than 0");
        }

        if args.duration_secs == 0 {
            bail!("DURATION_SECS must be greater than 0");
        }

        if args.wait_timeout_ms == 0 {
            bail!("WAIT_TIMEOUT_MS must be greater than 0");
        }

        let mut pool = PoolConfig::new(args.capacity)
            .with_wait_timeout(Duration::from_millis(args.wait_timeout_ms));

        if let Some(num_workers) = args.num_workers {
            if num_workers == 0 {
                bail!("NUM_WORKERS must be greater than 0");
            }
            pool = pool.with_workers(num_workers);
        }

        Ok(Self {
            pool,
            num_consumers: args.num_consumers,
            duration: Duration::from_secs(args.duration_secs),
            verify: args.verify,
        })
    }
}
