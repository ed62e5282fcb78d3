//! Run coordinator - orchestrates walkers and the aggregator on OS threads
//!
//! The coordinator is responsible for:
//! - Resolving the run's base seed
//! - Creating the report channel and one sender per walker
//! - Starting N walkers, then the aggregator, all running concurrently
//! - Waiting for the completion signal (with optional progress display)
//! - Joining every thread and building the run summary

use crate::config::RunConfig;
use crate::error::{panic_message, Result, RunError, WalkerError};
use crate::progress::ProgressReporter;
use crate::walker::aggregator::{Aggregator, Collection, Completion, CompletionSignal};
use crate::walker::channel::{ReportChannel, ReportSender, WalkerId};
use crate::walker::walk::clock_seed;
use crate::walker::worker::Walker;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of walkers launched
    pub walkers: usize,

    /// Base seed every walker's generator was derived from
    pub seed: u64,

    /// Reports drained by the aggregator
    pub collection: Collection,

    /// Wall clock time the run started
    pub started_at: DateTime<Utc>,

    /// Total run time, launch to last join
    pub duration: Duration,
}

/// Coordinates one run on OS threads
pub struct RunCoordinator {
    /// Configuration
    config: Arc<RunConfig>,

    /// Base seed for all walkers
    seed: u64,
}

impl RunCoordinator {
    /// Create a new run coordinator
    pub fn new(config: RunConfig) -> Self {
        let seed = config.seed.unwrap_or_else(clock_seed);

        Self {
            config: Arc::new(config),
            seed,
        }
    }

    /// Base seed for this run
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run all walkers to completion
    ///
    /// Walkers start before the aggregator; the channel is unbounded, so
    /// their reports wait in it until the aggregator drains them. If any
    /// thread fails to spawn, no run takes place: the walkers already
    /// started are joined and the spawn error is returned.
    pub fn run(self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let walker_count = self.config.walker_count;

        info!(
            walkers = walker_count,
            domain = self.config.domain_size,
            max_steps = self.config.max_steps,
            seed = self.seed,
            "Starting run"
        );
        debug!(start_time = %started_at.to_rfc3339(), "Run started");

        // Senders first; the channel then becomes the aggregator's receiver
        let channel = ReportChannel::new();
        let senders: Vec<ReportSender> = (0..walker_count).map(|_| channel.sender()).collect();
        let stats = channel.stats();

        let (notifier, signal) = CompletionSignal::pair();
        let aggregator = Aggregator::new(walker_count, channel.into_receiver(), notifier);
        let received = aggregator.progress();

        let walkers = self.spawn_walkers(senders)?;

        let aggregator_handle = match thread::Builder::new()
            .name("aggregator".into())
            .spawn(move || aggregator.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                return Err(abandon_run(
                    walkers,
                    WalkerError::AggregatorSpawnFailed(e.to_string()),
                ))
            }
        };

        let completion = self.wait_for_completion(&signal, &received, &aggregator_handle);

        let collection = aggregator_handle
            .join()
            .map_err(|payload| WalkerError::AggregatorPanicked(panic_message(payload.as_ref())))?;

        if let Some(Completion { walkers }) = completion {
            debug!(walkers = walkers, "Completion signal observed");
        }

        join_walkers(walkers)?;

        let duration = start_time.elapsed();

        info!(
            walkers = walker_count,
            sent = stats.sent(),
            received = stats.received(),
            total_steps = collection.total_steps(),
            duration_ms = duration.as_millis() as u64,
            "Run completed"
        );

        Ok(RunSummary {
            walkers: walker_count,
            seed: self.seed,
            collection,
            started_at,
            duration,
        })
    }

    /// Spawn one thread per walker, ids 1..=N
    fn spawn_walkers(&self, senders: Vec<ReportSender>) -> Result<Vec<Walker>> {
        let mut walkers = Vec::with_capacity(senders.len());

        for (index, sender) in senders.into_iter().enumerate() {
            match Walker::spawn(
                WalkerId::new(index + 1),
                Arc::clone(&self.config),
                self.seed,
                sender,
            ) {
                Ok(walker) => walkers.push(walker),
                Err(e) => return Err(abandon_run(walkers, e)),
            }
        }

        info!(count = walkers.len(), "Walkers spawned");
        Ok(walkers)
    }

    /// Wait for the aggregator's completion signal
    ///
    /// Polls only to refresh the progress display; the aggregator itself
    /// has no timeout. Returns early with `None` if the aggregator thread
    /// ended without signalling (it panicked).
    fn wait_for_completion(
        &self,
        signal: &CompletionSignal,
        received: &AtomicUsize,
        aggregator: &JoinHandle<Collection>,
    ) -> Option<Completion> {
        let check_interval = Duration::from_millis(100);
        let progress = self
            .config
            .show_progress
            .then(|| ProgressReporter::new(self.config.walker_count));

        loop {
            if let Some(completion) = signal.wait_timeout(check_interval) {
                if let Some(ref p) = progress {
                    p.update(completion.walkers);
                    p.finish("All walkers reported");
                }
                return Some(completion);
            }

            if aggregator.is_finished() {
                return signal.wait_timeout(Duration::ZERO);
            }

            if let Some(ref p) = progress {
                p.update(received.load(Ordering::Acquire));
            }
        }
    }
}

/// Give up on a run whose threads could not all be spawned
///
/// Walkers never block on delivery, so every started walker finishes and
/// is joined before the spawn error is handed back.
fn abandon_run(spawned: Vec<Walker>, error: WalkerError) -> RunError {
    warn!(spawned = spawned.len(), error = %error, "Spawn failed; abandoning run");
    if let Err(e) = join_walkers(spawned) {
        debug!(error = %e, "Walker also failed while abandoning run");
    }
    error.into()
}

/// Join all walker threads; the first failure is returned after all joins
fn join_walkers(walkers: Vec<Walker>) -> Result<()> {
    let mut first_error = None;

    for walker in walkers {
        let id = walker.id();
        if let Err(e) = walker.join() {
            warn!(walker = %id, error = %e, "Walker failed to join cleanly");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
