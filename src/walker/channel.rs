//! Report channel between walkers and the aggregator
//!
//! Many producers, one consumer. Each walker gets a one-shot
//! [`ReportSender`] whose `deliver` consumes it, so a walker cannot send
//! twice. The aggregator drains reports in whatever order they arrive.
//!
//! The receiving side keeps its own sender alive: if a walker dies
//! without reporting, `recv` keeps blocking instead of observing a
//! disconnect.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Walker identity, assigned by the orchestrator (1..=N)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkerId(usize);

impl WalkerId {
    /// Create a walker id
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Raw id value
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for WalkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One walker's result in flight to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Sending walker
    pub walker: WalkerId,

    /// Steps taken before leaving the domain or exhausting the budget
    pub steps: u64,
}

impl Report {
    /// Create a report
    pub fn new(walker: WalkerId, steps: u64) -> Self {
        Self { walker, steps }
    }
}

/// Walker side of the transport
///
/// `deliver` consumes the sink: one sink, one report. On failure the
/// report is handed back (the consumer is gone).
pub trait ReportSink: Send + 'static {
    fn deliver(self, report: Report) -> Result<(), Report>;
}

/// Aggregator side of the transport
///
/// `recv` blocks until any report is available. It never returns without
/// one; a missing report blocks forever.
pub trait ReportSource {
    fn recv(&mut self) -> Report;
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct ChannelStats {
    /// Reports handed to the channel
    pub sent: AtomicU64,

    /// Reports taken off the channel
    pub received: AtomicU64,
}

impl ChannelStats {
    /// Reports sent so far
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Reports received so far
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Reports sent but not yet received
    pub fn in_flight(&self) -> u64 {
        self.sent().saturating_sub(self.received())
    }
}

/// Unbounded MPSC report channel
pub struct ReportChannel {
    sender: Sender<Report>,
    receiver: Receiver<Report>,
    stats: Arc<ChannelStats>,
}

impl ReportChannel {
    /// Create a new channel
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();

        Self {
            sender,
            receiver,
            stats: Arc::new(ChannelStats::default()),
        }
    }

    /// Get a one-shot sender (one per walker)
    pub fn sender(&self) -> ReportSender {
        ReportSender {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get channel statistics
    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }

    /// Turn the channel into its single consumer
    pub fn into_receiver(self) -> ReportReceiver {
        ReportReceiver {
            receiver: self.receiver,
            _keepalive: self.sender,
            stats: self.stats,
        }
    }
}

impl Default for ReportChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot handle a walker uses to deliver its report
pub struct ReportSender {
    sender: Sender<Report>,
    stats: Arc<ChannelStats>,
}

impl ReportSink for ReportSender {
    fn deliver(self, report: Report) -> Result<(), Report> {
        // Unbounded: never waits on the consumer
        self.sender.send(report).map_err(|e| e.into_inner())?;
        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Consumer end of the report channel
pub struct ReportReceiver {
    receiver: Receiver<Report>,
    _keepalive: Sender<Report>,
    stats: Arc<ChannelStats>,
}

impl ReportReceiver {
    /// Take a report if one is pending
    pub fn try_recv(&mut self) -> Option<Report> {
        match self.receiver.try_recv() {
            Ok(report) => {
                self.stats.received.fetch_add(1, Ordering::Relaxed);
                Some(report)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of reports waiting to be received
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Get channel statistics
    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }
}

impl ReportSource for ReportReceiver {
    fn recv(&mut self) -> Report {
        match self.receiver.recv() {
            Ok(report) => {
                self.stats.received.fetch_add(1, Ordering::Relaxed);
                report
            }
            // Cannot disconnect while `_keepalive` is held; park like a
            // receive that never gets its message.
            Err(_) => loop {
                std::thread::park();
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_send_then_recv() {
        let channel = ReportChannel::new();
        let sender = channel.sender();
        let mut receiver = channel.into_receiver();

        sender.deliver(Report::new(WalkerId::new(1), 17)).unwrap();

        assert_eq!(receiver.pending(), 1);
        let report = receiver.recv();
        assert_eq!(report.walker, WalkerId::new(1));
        assert_eq!(report.steps, 17);
        assert_eq!(receiver.pending(), 0);
    }

    #[test]
    fn test_send_before_consumer_exists() {
        let channel = ReportChannel::new();
        let senders: Vec<_> = (1..=3).map(|_| channel.sender()).collect();

        for (i, sender) in senders.into_iter().enumerate() {
            sender.deliver(Report::new(WalkerId::new(i + 1), i as u64)).unwrap();
        }

        let stats = channel.stats();
        assert_eq!(stats.sent(), 3);
        assert_eq!(stats.in_flight(), 3);

        let mut receiver = channel.into_receiver();
        for _ in 0..3 {
            receiver.recv();
        }
        assert_eq!(stats.received(), 3);
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_senders_no_loss() {
        let channel = ReportChannel::new();
        let handles: Vec<_> = (1..=64)
            .map(|id| {
                let sender = channel.sender();
                thread::spawn(move || sender.deliver(Report::new(WalkerId::new(id), 0)))
            })
            .collect();

        let mut receiver = channel.into_receiver();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let mut ids: Vec<usize> = (0..64).map(|_| receiver.recv().walker.get()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=64).collect::<Vec<_>>());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_try_recv_empty() {
        let channel = ReportChannel::new();
        let mut receiver = channel.into_receiver();
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_walker_id_display() {
        assert_eq!(WalkerId::new(12).to_string(), "12");
        assert_eq!(WalkerId::new(12).get(), 12);
    }
}
