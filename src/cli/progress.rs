//! Spinner and summary reporting for headless sync.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{Entry, SyncProgress, SyncStats, SyncStatus, format_bytes};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// [`SyncProgress`] drawing a spinner with the current folder and printing
/// one line per finished file.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SyncProgress for SpinnerProgress {
    fn on_status(&self, status: &SyncStatus) {
        if let SyncStatus::ListingFailed(prefix) = status {
            self.bar.println(format!(
                "  {} {prefix}: {status}",
                style("!").yellow().bold()
            ));
        }
        self.bar.set_message(status.to_string());
    }

    fn on_file_downloaded(&self, name: &str, bytes: u64) {
        self.bar.println(format!(
            "  {} {name} ({})",
            style("\u{2713}").green(),
            format_bytes(bytes)
        ));
    }

    fn on_file_error(&self, name: &str, error: &str) {
        self.bar
            .println(format!("  {} {name}: {error}", style("\u{2717}").red()));
    }
}

/// Prints the children of `prefix` one per line, folders first marked
/// with a trailing slash.
pub fn print_listing(prefix: &str, entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries under '{prefix}'.");
        return;
    }
    for entry in entries.iter().filter(|e| e.is_folder()) {
        println!("  {}/", style(entry.label(prefix)).cyan().bold());
    }
    for entry in entries.iter().filter(|e| !e.is_folder()) {
        println!("  {}", entry.label(prefix));
    }
}

/// Prints a summary of one sync pass.
pub fn print_summary(stats: &SyncStats) {
    println!("\n{SEPARATOR}");
    println!("Sync Summary");
    println!("{SEPARATOR}");
    println!("  Folders listed:    {}", stats.folders_listed);
    if stats.folders_failed > 0 {
        println!(
            "  Folders failed:    {}",
            style(stats.folders_failed).red()
        );
    }
    println!("  Files downloaded:  {}", stats.files_downloaded);
    println!("  Total size:        {}", format_bytes(stats.bytes_downloaded));
    if stats.files_skipped > 0 {
        println!("  Files up to date:  {}", stats.files_skipped);
    }
    if stats.files_failed > 0 {
        println!("  Files failed:      {}", style(stats.files_failed).red());
    }
    println!("{SEPARATOR}");
}
