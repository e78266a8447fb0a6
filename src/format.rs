//! Human-readable text for status lines and summaries.

use chrono::{DateTime, TimeZone};

use crate::sync::SyncStats;

/// Formats a byte count with binary units (B, KB, MB, GB).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Wall-clock time of day, used to stamp the last finished pass.
#[must_use]
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}

/// One-line summary of a finished pass.
#[must_use]
pub fn summarize(stats: &SyncStats) -> String {
    let mut parts = vec![format!(
        "{} downloaded ({})",
        stats.files_downloaded,
        format_bytes(stats.bytes_downloaded)
    )];
    if stats.files_skipped > 0 {
        parts.push(format!("{} up to date", stats.files_skipped));
    }
    if stats.files_failed > 0 {
        parts.push(format!("{} failed", stats.files_failed));
    }
    if stats.folders_failed > 0 {
        parts.push(format!("{} folder(s) unreachable", stats.folders_failed));
    }
    parts.join(", ")
}
