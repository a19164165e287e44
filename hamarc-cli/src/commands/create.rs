//! Create and append commands.

use crate::utils::{create_spinner, print_problems};
use hamarc_archive::{ArchiveOptions, HamArchive};
use std::path::{Path, PathBuf};

pub fn cmd_create(
    archive: &Path,
    files: &[PathBuf],
    options: ArchiveOptions,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ham = HamArchive::create_new(archive, options)?;
    println!(
        "Created {} ({} bytes per chunk)",
        archive.display(),
        options.bytes_per_chunk
    );
    add_files(ham, files, progress)
}

pub fn cmd_append(
    archive: &Path,
    files: &[PathBuf],
    options: ArchiveOptions,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ham = HamArchive::create(archive, options)?;
    add_files(ham, files, progress)
}

fn add_files(
    mut ham: HamArchive,
    files: &[PathBuf],
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if files.is_empty() {
        ham.close()?;
        return Ok(());
    }

    let pb = create_spinner(format!("encoding {} file(s)", files.len()), progress);
    let report = ham.insert(files)?;
    pb.finish_and_clear();

    for path in &report.processed {
        println!("  added: {}", path.display());
    }
    print_problems(&report);
    println!(
        "{}: {} file(s) added, {} in archive",
        ham.path().display(),
        report.processed.len(),
        ham.file_count()
    );
    ham.close()?;
    Ok(())
}
