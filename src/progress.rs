//! Progress reporting for the search
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::{SearchProgress, SearchReport, SearchResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays search status
#[derive(Clone)]
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &SearchProgress) {
        let msg = format!(
            "Dirs: {} | Entries: {} | Rate: {:.0}/s | Queue: {} | Active: {}/{}",
            format_number(progress.dirs),
            format_number(progress.entries),
            progress.dirs_per_second(),
            progress.queue_len,
            progress.active,
            progress.threads,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the search
pub fn print_header(root: &str, target: &str, threads: usize) {
    println!();
    println!(
        "{} {}",
        style("treefind").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Looking for:").bold(), target);
    println!("  {} {}", style("Threads:").bold(), threads);
    println!();
}

/// Print a summary of the search
pub fn print_summary(report: &SearchReport) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    let title = match (&report.result, report.interrupted) {
        (SearchResult::Found(_), _) => style("Search Complete").green().bold(),
        (SearchResult::NotFound, true) => style("Search Interrupted").yellow().bold(),
        (SearchResult::NotFound, false) => style("Search Complete").green().bold(),
    };
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(report.dirs_visited)
    );
    println!(
        "  {} {}",
        style("Entries:").bold(),
        format_number(report.entries_seen)
    );
    println!("  {} {:.3}s", style("Duration:").bold(), duration_secs);
    if !report.failures.is_empty() {
        println!(
            "  {} {}",
            style("Unreadable:").yellow().bold(),
            format_number(report.failures.len() as u64)
        );
    }
    println!();
}

/// Print the verdict line
pub fn print_result(result: &SearchResult) {
    match result {
        SearchResult::Found(path) => println!("{}", path.display()),
        SearchResult::NotFound => println!("Nothing found"),
    }
}
