//! Walkers, the report channel and the aggregator
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐  ┌───────────┐         ┌───────────┐
//! │ Walker 1  │  │ Walker 2  │   ...   │ Walker N  │
//! │ walk →    │  │ walk →    │         │ walk →    │
//! │ 1 report  │  │ 1 report  │         │ 1 report  │
//! └─────┬─────┘  └─────┬─────┘         └─────┬─────┘
//!       │              │                     │
//!       └──────────────┼─────────────────────┘
//!                      ▼
//!         ┌──────────────────────────┐
//!         │     Report channel       │
//!         │  (unbounded MPSC, any    │
//!         │   arrival order)         │
//!         └────────────┬─────────────┘
//!                      ▼
//!         ┌──────────────────────────┐
//!         │       Aggregator         │
//!         │  Waiting(0) → Waiting(N) │
//!         │  → completion signal     │
//!         └──────────────────────────┘
//! ```

pub mod aggregator;
pub mod async_coordinator;
pub mod channel;
pub mod coordinator;
pub mod walk;
pub mod worker;

pub use aggregator::{Aggregator, Collection, Completion, CompletionCount, CompletionSignal};
pub use async_coordinator::AsyncRunCoordinator;
pub use channel::{Report, ReportChannel, ReportSink, ReportSource, WalkerId};
pub use coordinator::{RunCoordinator, RunSummary};
pub use walk::{random_walk, WalkParams};
pub use worker::Walker;
