//! Walker thread logic
//!
//! Each walker:
//! - Seeds its own random generator from the run's base seed and its id
//! - Runs one bounded random walk to completion
//! - Prints its result line
//! - Delivers exactly one report, then exits

use crate::config::RunConfig;
use crate::error::{panic_message, WalkerError};
use crate::progress::announce_walker_finished;
use crate::walker::channel::{Report, ReportSink, WalkerId};
use crate::walker::walk::{random_walk, walker_rng, WalkParams};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{trace, warn};

/// A walker running on its own thread
pub struct Walker {
    /// Walker ID
    id: WalkerId,

    /// Thread handle, yields the steps taken
    handle: JoinHandle<u64>,
}

impl Walker {
    /// Spawn a new walker thread
    pub fn spawn<S: ReportSink>(
        id: WalkerId,
        config: Arc<RunConfig>,
        base_seed: u64,
        sink: S,
    ) -> Result<Self, WalkerError> {
        let params = WalkParams::new(config.domain_size, config.max_steps);

        let handle = thread::Builder::new()
            .name(format!("walker-{}", id))
            .spawn(move || run_walker(id, params, base_seed, sink))
            .map_err(|e| WalkerError::SpawnFailed {
                id: id.get(),
                reason: e.to_string(),
            })?;

        Ok(Self { id, handle })
    }

    /// Get walker ID
    pub fn id(&self) -> WalkerId {
        self.id
    }

    /// Wait for the walker to finish, returning its step count
    pub fn join(self) -> Result<u64, WalkerError> {
        self.handle.join().map_err(|payload| WalkerError::Panicked {
            id: self.id.get(),
            message: panic_message(payload.as_ref()),
        })
    }
}

/// Walk, print, report once
///
/// Runs on whatever thread the caller provides; the sink is consumed.
pub fn run_walker<S: ReportSink>(id: WalkerId, params: WalkParams, base_seed: u64, sink: S) -> u64 {
    let mut rng = walker_rng(base_seed, id.get());
    let steps = random_walk(&params, &mut rng);

    announce_walker_finished(id.get(), steps);

    match sink.deliver(Report::new(id, steps)) {
        Ok(()) => trace!(walker = %id, steps = steps, "Report delivered"),
        Err(report) => warn!(
            walker = %report.walker,
            steps = report.steps,
            "Aggregator gone; report dropped"
        ),
    }

    steps
}
