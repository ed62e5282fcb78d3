//! Console output for a run
//!
//! Stdout carries only the run's contract lines: one line per walker and
//! the aggregator's two announcements. The spinner, header and summary
//! are drawn on stderr.

use crate::walker::RunSummary;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Line printed by a walker when it finishes
pub fn walker_finished_line(walker: usize, steps: u64) -> String {
    format!("Walker {} finished in {} steps.", walker, steps)
}

/// Line printed by the aggregator before its first receive
pub fn waiting_line(walkers: usize) -> String {
    format!("Controller: Waiting for {} walkers to finish...", walkers)
}

/// Line printed by the aggregator after its Nth receive
pub fn all_finished_line(walkers: usize) -> String {
    format!("Controller: All {} walkers have finished.", walkers)
}

/// Print a walker's result line to stdout
pub fn announce_walker_finished(walker: usize, steps: u64) {
    println!("{}", walker_finished_line(walker, steps));
}

/// Print the aggregator's waiting line to stdout
pub fn announce_waiting(walkers: usize) {
    println!("{}", waiting_line(walkers));
}

/// Print the aggregator's completion line to stdout
pub fn announce_all_finished(walkers: usize) {
    println!("{}", all_finished_line(walkers));
}

/// Spinner showing how many reports have arrived
pub struct ProgressReporter {
    bar: ProgressBar,
    expected: usize,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(expected: usize) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, expected }
    }

    /// Update the received count
    pub fn update(&self, received: usize) {
        self.bar.set_message(format!("Reports: {}/{}", received, self.expected));
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Print a header at the start of the run
pub fn print_header(walkers: usize, domain_size: u64, max_steps: u64, mode: &str) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("random-walk").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Walkers:").bold(), walkers);
    eprintln!("  {} [-{}, {}]", style("Domain:").bold(), domain_size, domain_size);
    eprintln!("  {} {}", style("Max steps:").bold(), max_steps);
    eprintln!("  {} {}", style("Mode:").bold(), mode);
    eprintln!();
}

/// Print a summary of the run
pub fn print_summary(summary: &RunSummary) {
    let collection = &summary.collection;

    eprintln!();
    eprintln!("{}", style("Run Complete").green().bold());
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Walkers:").bold(), summary.walkers);
    eprintln!("  {} {}", style("Seed:").bold(), summary.seed);
    if let (Some(min), Some(max)) = (collection.min_steps(), collection.max_steps()) {
        eprintln!(
            "  {} min {} / max {} / mean {:.1}",
            style("Steps:").bold(),
            min,
            max,
            collection.mean_steps()
        );
    }
    eprintln!(
        "  {} {}",
        style("Total steps:").bold(),
        collection.total_steps()
    );
    eprintln!(
        "  {} {:.3}s",
        style("Duration:").bold(),
        summary.duration.as_secs_f64()
    );
    eprintln!();
}
