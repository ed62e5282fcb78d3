//! random-walk - Bounded random walkers with a single aggregator
//!
//! Launches N independent walkers on the 1-D domain
//! `[-domain_size, domain_size]`. Each walker steps ±1 until it leaves the
//! domain or exhausts its step budget, then reports its step count exactly
//! once. A single aggregator drains exactly N reports in whatever order
//! they arrive and then signals completion.
//!
//! # Features
//!
//! - **Exactly-once reports**: each walker holds a one-shot sender that is
//!   consumed on delivery.
//!
//! - **Arrival-order independent**: the aggregator only counts; reports
//!   are taken from any walker as soon as they are available.
//!
//! - **Two runtimes**: one OS thread per walker with a blocking
//!   aggregator thread, or the same walker threads reporting to an async
//!   aggregator on the tokio runtime.
//!
//! - **Reproducible**: every walker's generator derives from a base seed,
//!   the wall clock by default or fixed with `--seed`.
//!
//! # Example
//!
//! ```bash
//! # Three walkers in [-1, 1], at most 100 steps each
//! random-walk 1 100 -w 3
//!
//! # Reproducible async run with a summary
//! random-walk 50 10000 -w 16 --seed 42 --async --summary
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, RunConfig};
pub use error::{ConfigError, Result, RunError, WalkerError};
pub use walker::{AsyncRunCoordinator, RunCoordinator, RunSummary};
