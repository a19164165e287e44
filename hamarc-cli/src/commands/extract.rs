//! Extract command implementation.

use crate::utils::{create_spinner, print_problems, side_dir};
use hamarc_archive::{ArchiveOptions, CorruptionPolicy, HamArchive};
use std::path::{Path, PathBuf};

pub fn cmd_extract(
    archive: &Path,
    files: &[String],
    output: Option<PathBuf>,
    policy: CorruptionPolicy,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| side_dir("extract_dir", archive));
    let options = ArchiveOptions::default().with_corruption_policy(policy);
    let mut ham = HamArchive::open_with(archive, options)?;

    let count = if files.is_empty() {
        ham.list().len()
    } else {
        files.len()
    };
    let pb = create_spinner(format!("decoding {} file(s)", count), progress);
    let report = ham.extract(files, &output)?;
    pb.finish_and_clear();

    for path in &report.processed {
        println!("  extracted: {}", path.display());
    }
    print_problems(&report);
    println!(
        "Extracted {} file(s) to {}",
        report.processed.len(),
        output.display()
    );
    ham.close()?;
    Ok(())
}
