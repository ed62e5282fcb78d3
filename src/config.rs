//! Configuration types for random-walk
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Immutable runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;

/// Maximum walker count (one OS thread per walker in sync mode)
pub const MAX_WALKERS: usize = 4096;

/// Bounded 1-D random walkers reporting to a single aggregator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "random-walk",
    version,
    about = "Bounded 1-D random walkers reporting to a single aggregator",
    long_about = "Launches N independent random walkers on the domain [-DOMAIN_SIZE, DOMAIN_SIZE].\n\n\
                  Each walker steps left or right until it leaves the domain or has taken\n\
                  MAX_STEPS steps, prints its step count and reports it once to the\n\
                  aggregator. The aggregator announces completion after all N reports.",
    after_help = "EXAMPLES:\n    \
        random-walk 10 1000 -w 8\n    \
        random-walk 1 100 -w 3 --seed 42\n    \
        random-walk 1000000 5 -w 5 --async --summary"
)]
pub struct CliArgs {
    /// Half-width of the walk domain (must be > 0)
    #[arg(value_name = "DOMAIN_SIZE", allow_negative_numbers = true)]
    pub domain_size: i64,

    /// Maximum steps per walker (must be >= 0)
    #[arg(value_name = "MAX_STEPS", allow_negative_numbers = true)]
    pub max_steps: i64,

    /// Number of walkers
    #[arg(
        short = 'w',
        long,
        default_value_t = default_walkers(),
        value_name = "NUM"
    )]
    pub walkers: usize,

    /// Base seed for reproducible runs (defaults to the wall clock)
    #[arg(long, value_name = "NUM")]
    pub seed: Option<u64>,

    /// Run walkers and the aggregator on the tokio runtime
    #[arg(long = "async")]
    pub use_async: bool,

    /// Show a progress spinner on stderr while reports arrive
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Print a run summary on stderr after completion
    #[arg(short = 's', long)]
    pub summary: bool,

    /// Verbose output (per-report debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_walkers() -> usize {
    num_cpus::get().clamp(1, MAX_WALKERS)
}

/// Validated, immutable run configuration
///
/// Shared by every walker and the aggregator through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Half-width of the domain `[-domain_size, domain_size]`
    pub domain_size: u64,

    /// Hard cap on steps per walker
    pub max_steps: u64,

    /// Number of walkers (N)
    pub walker_count: usize,

    /// Fixed base seed, if any
    pub seed: Option<u64>,

    /// Use the tokio orchestrator
    pub use_async: bool,

    /// Show progress spinner
    pub show_progress: bool,

    /// Print summary after the run
    pub show_summary: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl RunConfig {
    /// Create a validated configuration with default presentation settings
    pub fn new(domain_size: i64, max_steps: i64, walker_count: usize) -> Result<Self, ConfigError> {
        if domain_size <= 0 {
            return Err(ConfigError::InvalidDomainSize { size: domain_size });
        }

        if max_steps < 0 {
            return Err(ConfigError::InvalidMaxSteps { steps: max_steps });
        }

        if walker_count == 0 || walker_count > MAX_WALKERS {
            return Err(ConfigError::InvalidWalkerCount {
                count: walker_count,
                max: MAX_WALKERS,
            });
        }

        Ok(Self {
            domain_size: domain_size as u64,
            max_steps: max_steps as u64,
            walker_count,
            seed: None,
            use_async: false,
            show_progress: false,
            show_summary: false,
            verbose: false,
        })
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let config = Self::new(args.domain_size, args.max_steps, args.walkers)?;

        Ok(Self {
            seed: args.seed,
            use_async: args.use_async,
            show_progress: args.progress,
            show_summary: args.summary,
            verbose: args.verbose,
            ..config
        })
    }

    /// Fix the base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
