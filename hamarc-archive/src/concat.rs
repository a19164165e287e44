//! Merge several HAM archives into one.
//!
//! Each entry of a source is decoded to its own scratch file and then
//! re-encoded into the destination, so sources may use a different chunk
//! size than the destination and entries sharing a name all survive.

use crate::ham::{ArchiveOptions, BatchReport, HamArchive};
use hamarc_core::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One decoded entry waiting in the scratch directory.
struct Staged {
    name: String,
    origin: PathBuf,
    scratch: PathBuf,
    size: u64,
}

/// Append every entry of every archive in `sources` to `dest`.
///
/// `dest` is created with `options` if it does not exist. A source that is
/// the destination itself is skipped. Sources that cannot be opened, and
/// entries that cannot be decoded, are recorded in the report; everything
/// else is still merged. Processed items are reported as
/// `<source>/<entry name>`. Failures while writing `dest` abort the merge.
pub fn concat<P, Q>(dest: P, sources: &[Q], options: ArchiveOptions) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let dest = dest.as_ref();
    let mut target = HamArchive::create(dest, options)?;
    let dest_id = fs::canonicalize(dest)?;
    let mut report = BatchReport::default();

    for source in sources {
        let source = source.as_ref();
        if fs::canonicalize(source).is_ok_and(|id| id == dest_id) {
            tracing::warn!(source = %source.display(), "skipping destination listed as source");
            continue;
        }

        let scratch = tempfile::Builder::new().prefix("hamarc-concat-").tempdir()?;
        let staged = match stage_source(source, options, scratch.path(), &mut report) {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(source = %source.display(), error = %e, "cannot read source archive");
                report.failed.push((source.display().to_string(), e.to_string()));
                continue;
            }
        };
        if staged.is_empty() {
            continue;
        }

        target.reserve_slots(staged.len() as u64)?;
        let mut merged = 0usize;
        for item in staged {
            let appended = File::open(&item.scratch).map_err(Into::into).and_then(|file| {
                target.append_encoded(&item.name, &mut BufReader::new(file), item.size)
            });
            match appended {
                Ok(()) => {
                    merged += 1;
                    report.processed.push(item.origin);
                }
                Err(e) => {
                    tracing::error!(entry = %item.origin.display(), error = %e, "cannot merge entry");
                    report.failed.push((item.origin.display().to_string(), e.to_string()));
                }
            }
        }
        target.finish_append()?;
        tracing::debug!(source = %source.display(), entries = merged, "merged archive");
    }

    tracing::info!(
        dest = %dest.display(),
        file_count = target.file_count(),
        "concat complete"
    );
    target.close()?;
    Ok(report)
}

/// Decode every entry of `source` into `scratch`, one file per table index.
///
/// Entries that fail to decode are recorded in `report` and left out.
fn stage_source(
    source: &Path,
    options: ArchiveOptions,
    scratch: &Path,
    report: &mut BatchReport,
) -> Result<Vec<Staged>> {
    let mut archive = HamArchive::open_with(source, options)?;
    let entries = archive.list().to_vec();
    let mut staged = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let origin = source.join(&entry.name);
        let path = scratch.join(index.to_string());
        match decode_into(&mut archive, index, &path) {
            Ok(corrupted) => {
                report.corrupted_chunks += corrupted;
                staged.push(Staged {
                    name: entry.name,
                    origin,
                    scratch: path,
                    size: entry.plain_size,
                });
            }
            Err(e) => {
                tracing::error!(entry = %origin.display(), error = %e, "cannot decode entry");
                report.failed.push((origin.display().to_string(), e.to_string()));
            }
        }
    }
    archive.close()?;
    Ok(staged)
}

fn decode_into(archive: &mut HamArchive, index: usize, path: &Path) -> Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let decoded = archive.decode_to(index, &mut out)?;
    out.flush()?;
    Ok(decoded.corrupted_chunks.len() as u64)
}
