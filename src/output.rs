//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Export
//!
//! ```text
//! 001 out/crop.jpg → jpeg, 18.4 KB
//! 002 out/crop.png → png, 96.1 KB
//! 003 /root/locked/crop.webp → failed (code 2): Failed to open ...
//!
//! Exported 2 of 3 images
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `String` or `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::persist::{PersistError, Saved};
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count with one decimal above 1 KB.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// One line per export destination.
///
/// ```text
/// 001 out/crop.jpg → jpeg, 18.4 KB
/// 002 out/bad.png → failed (code 3): Encode failed: ...
/// ```
pub fn format_export_line(
    index: usize,
    destination: &Path,
    result: &Result<Saved, PersistError>,
) -> String {
    match result {
        Ok(saved) => format!(
            "{} {} → {}, {}",
            format_index(index),
            destination.display(),
            saved.format,
            format_size(saved.bytes_written)
        ),
        Err(e) => format!(
            "{} {} → failed (code {}): {}",
            format_index(index),
            destination.display(),
            e.status_code(),
            e
        ),
    }
}

/// Lines for a whole export run, ending with a summary.
pub fn format_export_output(results: &[(PathBuf, Result<Saved, PersistError>)]) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, (dest, result))| format_export_line(i + 1, dest, result))
        .collect();

    let saved = results.iter().filter(|(_, r)| r.is_ok()).count();
    lines.push(String::new());
    lines.push(match results.len() {
        1 if saved == 1 => "Exported 1 image".to_string(),
        total => format!("Exported {saved} of {total} images"),
    });
    lines
}

pub fn print_export_output(results: &[(PathBuf, Result<Saved, PersistError>)]) {
    for line in format_export_output(results) {
        println!("{}", line);
    }
}
