//! Concat command implementation.

use crate::utils::print_problems;
use hamarc_archive::{ArchiveOptions, HamArchive, concat};
use std::path::{Path, PathBuf};

pub fn cmd_concat(
    dest: &Path,
    sources: &[PathBuf],
    options: ArchiveOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = concat(dest, sources, options)?;
    print_problems(&report);

    let merged = HamArchive::open(dest)?;
    println!(
        "Merged {} file(s) into {} ({} in archive)",
        report.processed.len(),
        dest.display(),
        merged.file_count()
    );
    Ok(())
}
