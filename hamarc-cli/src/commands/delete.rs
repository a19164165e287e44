//! Delete command implementation.

use crate::utils::{print_problems, side_dir};
use hamarc_archive::HamArchive;
use std::path::{Path, PathBuf};

pub fn cmd_delete(
    archive: &Path,
    files: &[String],
    backup_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let backup_dir = backup_dir.unwrap_or_else(|| side_dir("delete_dir", archive));
    let mut ham = HamArchive::open(archive)?;

    let report = ham.delete(files, &backup_dir)?;
    for path in &report.processed {
        println!("  deleted: {} (backup)", path.display());
    }
    print_problems(&report);
    println!(
        "Deleted {} file(s), {} left in {}",
        report.processed.len(),
        ham.file_count(),
        archive.display()
    );
    ham.close()?;
    Ok(())
}
