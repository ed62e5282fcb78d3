//! Async run coordinator - the same run on the tokio runtime
//!
//! Each walker runs on its own OS thread (a walk is CPU-bound and never
//! yields), so walkers never queue behind the runtime's blocking pool.
//! A walker's exit is delivered to the runtime through a oneshot. The
//! aggregator is an async task draining an unbounded mpsc channel, so its
//! only suspension point is `recv().await`.

use crate::config::RunConfig;
use crate::error::{panic_message, Result, WalkerError};
use crate::progress::ProgressReporter;
use crate::walker::aggregator::{Collection, CompletionSignal, Collector};
use crate::walker::channel::{Report, ReportSink, WalkerId};
use crate::walker::coordinator::RunSummary;
use crate::walker::walk::{clock_seed, WalkParams};
use crate::walker::worker::run_walker;
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// One-shot walker sink over a tokio unbounded channel
pub struct AsyncReportSender {
    sender: mpsc::UnboundedSender<Report>,
}

impl ReportSink for AsyncReportSender {
    fn deliver(self, report: Report) -> std::result::Result<(), Report> {
        self.sender.send(report).map_err(|e| e.0)
    }
}

/// A walker thread observed from the runtime
struct AsyncWalker {
    id: WalkerId,
    done: oneshot::Receiver<thread::Result<u64>>,
}

impl AsyncWalker {
    /// Spawn the walker on a dedicated thread
    fn spawn(id: WalkerId, params: WalkParams, seed: u64, sink: AsyncReportSender) -> Result<Self> {
        let (done_tx, done) = oneshot::channel();

        thread::Builder::new()
            .name(format!("walker-{}", id))
            .spawn(move || {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| run_walker(id, params, seed, sink)));
                let _ = done_tx.send(outcome);
            })
            .map_err(|e| WalkerError::SpawnFailed {
                id: id.get(),
                reason: e.to_string(),
            })?;

        Ok(Self { id, done })
    }

    /// Wait for the walker thread to finish, returning its step count
    async fn join(self) -> std::result::Result<u64, WalkerError> {
        match self.done.await {
            Ok(Ok(steps)) => Ok(steps),
            Ok(Err(payload)) => Err(WalkerError::Panicked {
                id: self.id.get(),
                message: panic_message(payload.as_ref()),
            }),
            Err(_) => Err(WalkerError::Panicked {
                id: self.id.get(),
                message: "walker thread exited without finishing".into(),
            }),
        }
    }
}

/// Async run coordinator using tokio
pub struct AsyncRunCoordinator {
    config: Arc<RunConfig>,
    seed: u64,
}

impl AsyncRunCoordinator {
    /// Create a new async coordinator
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
    pub async fn run(self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let walker_count = self.config.walker_count;

        info!(
            walkers = walker_count,
            domain = self.config.domain_size,
            max_steps = self.config.max_steps,
            seed = self.seed,
            "Starting async run"
        );

        let (tx, rx) = mpsc::unbounded_channel::<Report>();
        let (notifier, signal) = CompletionSignal::pair();
        let collector = Collector::new(walker_count, notifier);
        let received = collector.progress();

        // The aggregator holds a sender so a missing report blocks it
        // rather than closing the channel.
        let mut aggregator = tokio::spawn(aggregate(collector, rx, tx.clone()));

        let params = WalkParams::new(self.config.domain_size, self.config.max_steps);
        let mut walkers = Vec::with_capacity(walker_count);
        for id in 1..=walker_count {
            let sink = AsyncReportSender { sender: tx.clone() };
            match AsyncWalker::spawn(WalkerId::new(id), params, self.seed, sink) {
                Ok(walker) => walkers.push(walker),
                Err(e) => {
                    // No run without all N walkers: release the aggregator
                    // and wait out the walkers already started.
                    warn!(walker = id, error = %e, "Walker spawn failed; abandoning run");
                    aggregator.abort();
                    drop(tx);
                    let _ = join_walkers(walkers).await;
                    return Err(e);
                }
            }
        }
        drop(tx);

        info!(count = walkers.len(), "Walkers spawned");

        let progress = self
            .config
            .show_progress
            .then(|| ProgressReporter::new(walker_count));
        let mut ticker = tokio::time::interval(Duration::from_millis(100));

        let collection = loop {
            tokio::select! {
                joined = &mut aggregator => {
                    break joined.map_err(|e| {
                        WalkerError::AggregatorPanicked(join_error_message(e))
                    })?;
                }
                _ = ticker.tick() => {
                    if let Some(ref p) = progress {
                        p.update(received.load(Ordering::Acquire));
                    }
                }
            }
        };

        if let Some(ref p) = progress {
            p.update(collection.len());
            p.finish("All walkers reported");
        }

        if let Some(completion) = signal.wait_timeout(Duration::ZERO) {
            debug!(walkers = completion.walkers, "Completion signal observed");
        }

        join_walkers(walkers).await?;

        let duration = start_time.elapsed();

        info!(
            walkers = walker_count,
            total_steps = collection.total_steps(),
            duration_ms = duration.as_millis() as u64,
            "Async run completed"
        );

        Ok(RunSummary {
            walkers: walker_count,
            seed: self.seed,
            collection,
            started_at,
            duration,
        })
    }
}

/// Aggregator task: exactly N receives, then completion
async fn aggregate(
    mut collector: Collector,
    mut rx: mpsc::UnboundedReceiver<Report>,
    _keepalive: mpsc::UnboundedSender<Report>,
) -> Collection {
    collector.begin();

    while !collector.count().is_complete() {
        let report = match rx.recv().await {
            Some(report) => report,
            None => std::future::pending().await,
        };
        collector.record(report);
    }

    collector.finish()
}

/// Await every walker thread; the first failure is returned after all joins
async fn join_walkers(walkers: Vec<AsyncWalker>) -> Result<()> {
    let mut first_error = None;

    for walker in walkers {
        let id = walker.id;
        if let Err(error) = walker.join().await {
            warn!(walker = %id, error = %error, "Walker failed to join cleanly");
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn join_error_message(e: JoinError) -> String {
    if e.is_panic() {
        panic_message(e.into_panic().as_ref())
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_run_collects_every_walker() {
        let config = RunConfig::new(3, 300, 5).unwrap().with_seed(8);
        let summary = AsyncRunCoordinator::new(config).run().await.unwrap();

        assert_eq!(summary.walkers, 5);
        assert_eq!(summary.collection.len(), 5);

        let ids: HashSet<usize> = summary
            .collection
            .reports
            .iter()
            .map(|r| r.walker.get())
            .collect();
        assert_eq!(ids.len(), 5);
        assert!(summary.collection.reports.iter().all(|r| r.steps <= 300));
    }

    #[tokio::test]
    async fn test_async_matches_sync_for_same_seed() {
        use crate::walker::coordinator::RunCoordinator;

        let config = RunConfig::new(6, 2_000, 4).unwrap().with_seed(31);

        let sorted = |summary: RunSummary| {
            let mut steps: Vec<(usize, u64)> = summary
                .collection
                .reports
                .iter()
                .map(|r| (r.walker.get(), r.steps))
                .collect();
            steps.sort_unstable();
            steps
        };

        let async_steps = sorted(AsyncRunCoordinator::new(config.clone()).run().await.unwrap());
        let sync_steps = sorted(
            tokio::task::spawn_blocking(move || RunCoordinator::new(config).run())
                .await
                .unwrap()
                .unwrap(),
        );

        assert_eq!(async_steps, sync_steps);
    }

    #[test]
    fn test_walkers_do_not_wait_on_blocking_pool() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .max_blocking_threads(1)
            .enable_all()
            .build()
            .unwrap();

        // Hold the runtime's only blocking thread for the whole run
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
        let occupied = runtime.spawn_blocking(move || {
            let _ = release_rx.recv_timeout(Duration::from_secs(30));
        });

        let config = RunConfig::new(2, 200, 600).unwrap().with_seed(13);
        let summary = runtime
            .block_on(async {
                tokio::time::timeout(
                    Duration::from_secs(20),
                    AsyncRunCoordinator::new(config).run(),
                )
                .await
            })
            .expect("run waited on the blocking pool")
            .unwrap();

        assert_eq!(summary.walkers, 600);
        assert_eq!(summary.collection.len(), 600);

        release_tx.send(()).unwrap();
        runtime.block_on(occupied).unwrap();
    }

    #[tokio::test]
    async fn test_aggregate_waits_for_missing_report() {
        let (tx, rx) = mpsc::unbounded_channel::<Report>();
        // A keepalive from an unrelated channel lets `rx` actually close
        let (detached, _unused) = mpsc::unbounded_channel::<Report>();
        let (notifier, signal) = CompletionSignal::pair();
        let collector = Collector::new(3, notifier);
        let received = collector.progress();

        let mut handle = tokio::spawn(aggregate(collector, rx, detached));

        for id in 1..=2 {
            let sink = AsyncReportSender { sender: tx.clone() };
            sink.deliver(Report::new(WalkerId::new(id), id as u64)).unwrap();
        }
        drop(tx);

        let waited = tokio::time::timeout(Duration::from_millis(200), &mut handle).await;
        assert!(waited.is_err());
        assert!(!signal.is_complete());
        assert_eq!(received.load(Ordering::Acquire), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_aggregate_completes_on_last_report() {
        let (tx, rx) = mpsc::unbounded_channel::<Report>();
        let (notifier, signal) = CompletionSignal::pair();
        let collector = Collector::new(3, notifier);

        let handle = tokio::spawn(aggregate(collector, rx, tx.clone()));

        for id in [3, 1, 2] {
            let sink = AsyncReportSender { sender: tx.clone() };
            sink.deliver(Report::new(WalkerId::new(id), 4)).unwrap();
        }
        drop(tx);

        let collection = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(collection.len(), 3);
        assert!(signal.is_complete());
    }

    #[test]
    fn test_sender_reports_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let sink = AsyncReportSender { sender: tx };
        let report = Report::new(WalkerId::new(1), 3);
        assert_eq!(sink.deliver(report), Err(report));
    }
}
