//! Aggregator - waits for exactly one report per walker
//!
//! State machine: `Waiting(k)` for `k` in `0..=N`, advancing by one per
//! received report. `Waiting(N)` is terminal and fires the completion
//! signal exactly once. There is no timeout: fewer than N reports means
//! the aggregator waits forever.

use crate::progress::{announce_all_finished, announce_waiting};
use crate::walker::channel::{Report, ReportSource, WalkerId};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Count of reports received against the number expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionCount {
    received: usize,
    expected: usize,
}

impl CompletionCount {
    /// Start at `Waiting(0)`
    pub fn new(expected: usize) -> Self {
        Self {
            received: 0,
            expected,
        }
    }

    /// Advance `Waiting(k)` to `Waiting(k + 1)`
    ///
    /// Returns false (and does not advance) once terminal.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.received += 1;
        true
    }

    /// Reports received so far
    pub fn received(&self) -> usize {
        self.received
    }

    /// Reports expected in total
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Terminal state reached
    pub fn is_complete(&self) -> bool {
        self.received == self.expected
    }
}

/// The completion event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Number of walkers that reported
    pub walkers: usize,
}

/// Sending half of the completion signal, fired once by the aggregator
pub struct CompletionNotifier {
    sender: Sender<Completion>,
}

impl CompletionNotifier {
    fn fire(self, completion: Completion) {
        // Observer may have gone away; completion still happened
        let _ = self.sender.send(completion);
    }
}

/// Observer half of the completion signal
pub struct CompletionSignal {
    receiver: Receiver<Completion>,
}

impl CompletionSignal {
    /// Create a connected notifier/signal pair
    pub fn pair() -> (CompletionNotifier, CompletionSignal) {
        let (sender, receiver) = bounded(1);
        (CompletionNotifier { sender }, CompletionSignal { receiver })
    }

    /// Block until the aggregator completes
    ///
    /// Returns `None` only if the aggregator went away without completing.
    pub fn wait(&self) -> Option<Completion> {
        self.receiver.recv().ok()
    }

    /// Wait up to `timeout`; `None` means not completed yet
    ///
    /// For observers only. The aggregator itself never times out.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking check
    pub fn is_complete(&self) -> bool {
        !self.receiver.is_empty()
    }
}

/// Reports drained by the aggregator, in arrival order
#[derive(Debug, Clone)]
pub struct Collection {
    /// Reports in arrival order
    pub reports: Vec<Report>,

    /// Time from the first wait to the Nth report
    pub elapsed: Duration,
}

impl Collection {
    /// Number of reports collected
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// True if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Fewest steps reported
    pub fn min_steps(&self) -> Option<u64> {
        self.reports.iter().map(|r| r.steps).min()
    }

    /// Most steps reported
    pub fn max_steps(&self) -> Option<u64> {
        self.reports.iter().map(|r| r.steps).max()
    }

    /// Sum of all reported steps
    pub fn total_steps(&self) -> u64 {
        self.reports.iter().map(|r| r.steps).sum()
    }

    /// Mean steps per walker
    pub fn mean_steps(&self) -> f64 {
        if self.reports.is_empty() {
            0.0
        } else {
            self.total_steps() as f64 / self.reports.len() as f64
        }
    }

    /// Steps reported by a given walker
    pub fn steps_for(&self, walker: WalkerId) -> Option<u64> {
        self.reports
            .iter()
            .find(|r| r.walker == walker)
            .map(|r| r.steps)
    }
}

/// Transport-independent collection state
///
/// Shared by the thread aggregator and the async orchestrator.
pub struct Collector {
    count: CompletionCount,
    seen: HashSet<WalkerId>,
    reports: Vec<Report>,
    progress: Arc<AtomicUsize>,
    notifier: CompletionNotifier,
    started: Instant,
}

impl Collector {
    /// Create a collector expecting `expected` reports
    pub fn new(expected: usize, notifier: CompletionNotifier) -> Self {
        Self {
            count: CompletionCount::new(expected),
            seen: HashSet::with_capacity(expected),
            reports: Vec::with_capacity(expected),
            progress: Arc::new(AtomicUsize::new(0)),
            notifier,
            started: Instant::now(),
        }
    }

    /// Shared counter of reports received so far
    pub fn progress(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Current state
    pub fn count(&self) -> CompletionCount {
        self.count
    }

    /// Announce the wait and start the clock
    pub fn begin(&mut self) {
        self.started = Instant::now();
        announce_waiting(self.count.expected());
        info!(walkers = self.count.expected(), "Aggregator waiting for reports");
    }

    /// Record one report; returns true once terminal
    pub fn record(&mut self, report: Report) -> bool {
        if !self.count.advance() {
            warn!(walker = %report.walker, "Report received after completion; ignored");
            return true;
        }

        if !self.seen.insert(report.walker) {
            warn!(walker = %report.walker, "Walker reported more than once");
        }

        self.reports.push(report);
        self.progress.store(self.count.received(), Ordering::Release);

        debug!(
            walker = %report.walker,
            steps = report.steps,
            received = self.count.received(),
            expected = self.count.expected(),
            "Report received"
        );

        self.count.is_complete()
    }

    /// Announce completion, fire the signal, and hand back the reports
    pub fn finish(self) -> Collection {
        let walkers = self.count.received();
        let elapsed = self.started.elapsed();

        announce_all_finished(walkers);
        info!(
            walkers = walkers,
            elapsed_ms = elapsed.as_millis() as u64,
            "All walkers reported"
        );

        self.notifier.fire(Completion { walkers });

        Collection {
            reports: self.reports,
            elapsed,
        }
    }
}

/// Blocking aggregator over any [`ReportSource`]
pub struct Aggregator<S: ReportSource> {
    source: S,
    collector: Collector,
}

impl<S: ReportSource> Aggregator<S> {
    /// Create an aggregator expecting `expected` reports from `source`
    pub fn new(expected: usize, source: S, notifier: CompletionNotifier) -> Self {
        Self {
            source,
            collector: Collector::new(expected, notifier),
        }
    }

    /// Shared counter of reports received so far
    pub fn progress(&self) -> Arc<AtomicUsize> {
        self.collector.progress()
    }

    /// Receive exactly N reports, then signal completion
    pub fn run(mut self) -> Collection {
        self.collector.begin();

        while !self.collector.count().is_complete() {
            let report = self.source.recv();
            self.collector.record(report);
        }

        self.collector.finish()
    }
}
