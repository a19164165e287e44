//! Utility functions for the CLI.

use hamarc_archive::{BatchReport, FileEntry};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Create a spinner for a batch operation.
pub fn create_spinner(message: String, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("[{elapsed_precise}] {spinner} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Default side directory for an archive, e.g. `./extract_dir_backup.ham`.
pub fn side_dir(prefix: &str, archive: &Path) -> PathBuf {
    let base = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    PathBuf::from(format!("./{prefix}_{base}"))
}

/// Print the skipped and failed items of a batch.
pub fn print_problems(report: &BatchReport) {
    for name in &report.missing {
        eprintln!("  not found: {}", name);
    }
    for (name, reason) in &report.failed {
        eprintln!("  FAILED: {} - {}", name, reason);
    }
    if report.corrupted_chunks > 0 {
        eprintln!(
            "  warning: {} corrupted chunk(s) zero-filled",
            report.corrupted_chunks
        );
    }
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[FileEntry], long: bool) {
    if long {
        println!(
            "{:>10} {:>10} {:>10} {:>6}  Name",
            "Size", "Encoded", "Offset", "Ovhd"
        );
        println!("{}", "-".repeat(60));

        let mut total_size = 0u64;
        let mut total_encoded = 0u64;

        for entry in entries {
            println!(
                "{:>10} {:>10} {:>10} {:>6}  {}",
                entry.plain_size,
                entry.enc_size,
                entry.offset,
                overhead(entry.plain_size, entry.enc_size),
                entry.name
            );
            total_size += entry.plain_size;
            total_encoded += entry.enc_size;
        }

        println!("{}", "-".repeat(60));
        println!(
            "{:>10} {:>10} {:>10} {:>6}  {} files",
            total_size,
            total_encoded,
            "",
            overhead(total_size, total_encoded),
            entries.len()
        );
    } else {
        for entry in entries {
            println!("{}", entry.name);
        }
    }
}

/// Encoding overhead as a percentage of the plaintext size.
fn overhead(plain: u64, encoded: u64) -> String {
    if plain == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", (encoded as f64 / plain as f64 - 1.0) * 100.0)
}
