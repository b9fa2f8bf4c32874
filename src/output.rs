//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **attempt-centric**: the primary display for a compression run
//! is its quality walk — one line per attempt with size and budget verdict —
//! with the source file as the header and store results as trailing context
//! lines. The report reads as the story of how the final size was reached:
//!
//! ```text
//! IMG_2024.jpg
//!     Source: 3024x4032 → 800x1067
//!     q80: 1.62 MiB over budget
//!     q70: 878.9 KiB fits
//!     Final: 878.9 KiB at q70
//!     Stored: 1724601600124.jpg
//! ```
//!
//! All `format_*` functions are pure and return lines; `print_*` wrappers
//! just write them to stdout. Tests assert on the lines.

use crate::imaging::{Attempt, Compressed, Dimensions, Quality};
use crate::pipeline::UploadReceipt;

/// Human-readable byte size: `87 B`, `643.0 KiB`, `1.62 MiB`.
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Shared body of the check and upload reports.
fn walk_lines(
    source: Dimensions,
    output: Dimensions,
    attempts: &[Attempt],
    final_quality: Quality,
    final_size: u64,
    within_limit: bool,
    max_bytes: u64,
) -> Vec<String> {
    let mut lines = vec![format!("    Source: {source} → {output}")];
    for attempt in attempts {
        let verdict = if attempt.size_bytes > max_bytes {
            "over budget"
        } else {
            "fits"
        };
        lines.push(format!(
            "    {}: {} {}",
            attempt.quality,
            format_size(attempt.size_bytes),
            verdict
        ));
    }
    lines.push(format!(
        "    Final: {} at {}",
        format_size(final_size),
        final_quality
    ));
    if !within_limit {
        lines.push("    Budget: exceeded at quality floor".to_string());
    }
    lines
}

/// Format a dry-run compression report (`check` command).
pub fn format_check_report(name: &str, compressed: &Compressed, max_bytes: u64) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    lines.extend(walk_lines(
        compressed.source,
        compressed.output,
        &compressed.attempts,
        compressed.quality,
        compressed.size_bytes(),
        compressed.within_limit,
        max_bytes,
    ));
    lines
}

/// Format a completed upload report.
pub fn format_upload_report(name: &str, receipt: &UploadReceipt, max_bytes: u64) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    lines.extend(walk_lines(
        receipt.source,
        receipt.output,
        &receipt.attempts,
        receipt.quality,
        receipt.size_bytes,
        receipt.within_limit,
        max_bytes,
    ));
    lines.push(format!("    Stored: {}", receipt.path));
    lines
}

/// One-line summary for a fetched object.
pub fn format_fetch_line(key: &str, size_bytes: u64, dest: &str) -> String {
    format!("Fetched {} ({}) → {}", key, format_size(size_bytes), dest)
}

/// Print a check report to stdout.
pub fn print_check_report(name: &str, compressed: &Compressed, max_bytes: u64) {
    for line in format_check_report(name, compressed, max_bytes) {
        println!("{line}");
    }
}

/// Print an upload report to stdout.
pub fn print_upload_report(name: &str, receipt: &UploadReceipt, max_bytes: u64) {
    for line in format_upload_report(name, receipt, max_bytes) {
        println!("{line}");
    }
}
