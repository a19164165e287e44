//! HAM archive container.
//!
//! A HAM archive is a single file holding a fixed header, a growable entry
//! table and a contiguous payload region. Every payload is the chunked
//! Hamming encoding of one source file.
//!
//! The table reserves a few free slots ("slack") so that small inserts do
//! not move the payload. When the slack runs out the table grows and the
//! whole payload region is shifted forward in place; when an entry is
//! deleted, everything after it is shifted back so the payload stays
//! gap-free. Offsets therefore always satisfy
//!
//! ```text
//! entry[0].offset   == HEADER_SIZE + (file_count + free_header_slack) * ENTRY_SIZE
//! entry[i+1].offset == entry[i].offset + entry[i].enc_size
//! ```
//!
//! The header and the full table are rewritten after every mutation.

mod header;

pub use header::{
    ArchiveHeader, ENTRY_SIZE, FileEntry, HEADER_SIZE, MAGIC, MAX_NAME_BYTES, NAME_LEN,
    truncate_name,
};

use hamarc_core::{HamArcError, Result, shift_range};
use hamarc_hamming::{
    ChunkConfig, ChunkedCodec, CorruptionPolicy, DEFAULT_BYTES_PER_CHUNK, DecodeReport,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Number of free table slots reserved whenever the table has to grow.
pub const DEFAULT_SLACK_RESTOCK: u64 = 1;

/// Options for creating and opening archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Plaintext bytes per chunk for new archives. Existing archives keep
    /// the value stored in their header.
    pub bytes_per_chunk: usize,
    /// Free slots left in the table after it grows.
    pub slack_restock: u64,
    /// Handling of chunks that fail their parity check.
    pub corruption_policy: CorruptionPolicy,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            bytes_per_chunk: DEFAULT_BYTES_PER_CHUNK,
            slack_restock: DEFAULT_SLACK_RESTOCK,
            corruption_policy: CorruptionPolicy::Skip,
        }
    }
}

impl ArchiveOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size used when a new archive is created.
    pub fn with_chunk_size(mut self, bytes_per_chunk: usize) -> Self {
        self.bytes_per_chunk = bytes_per_chunk;
        self
    }

    /// Set how many free slots the table keeps after growing.
    pub fn with_slack_restock(mut self, slots: u64) -> Self {
        self.slack_restock = slots;
        self
    }

    /// Set the corruption policy used when decoding payloads.
    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.corruption_policy = policy;
        self
    }
}

/// Per-item outcome of a batched operation.
///
/// Items that fail individually are recorded here; the rest of the batch
/// still runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Paths produced or consumed: inserted sources, extracted files,
    /// delete backups, or merged `<source>/<entry name>` items.
    pub processed: Vec<PathBuf>,
    /// Requested names that are not in the archive.
    pub missing: Vec<String>,
    /// Items that failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Chunks that failed their parity check while decoding.
    pub corrupted_chunks: u64,
}

impl BatchReport {
    /// True if nothing was missing or failed.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.processed.extend(other.processed);
        self.missing.extend(other.missing);
        self.failed.extend(other.failed);
        self.corrupted_chunks += other.corrupted_chunks;
    }
}

/// Source file opened for insertion.
struct Source {
    path: PathBuf,
    name: String,
    file: File,
    size: u64,
}

/// An open HAM archive.
#[derive(Debug)]
pub struct HamArchive {
    file: File,
    path: PathBuf,
    header: ArchiveHeader,
    entries: Vec<FileEntry>,
    codec: ChunkedCodec,
    options: ArchiveOptions,
}

impl HamArchive {
    /// Open the archive at `path`, creating an empty one if it does not exist.
    pub fn create<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open_with(path, options)
        } else {
            Self::create_new(path, options)
        }
    }

    /// Create an empty archive at `path`, replacing any existing file.
    pub fn create_new<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        let config = ChunkConfig::new(options.bytes_per_chunk)?;
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut archive = Self {
            file,
            path: path.to_path_buf(),
            header: ArchiveHeader::new(options.bytes_per_chunk as u64),
            entries: Vec::new(),
            codec: ChunkedCodec::new(config),
            options,
        };
        archive.write_table()?;

        tracing::info!(
            path = %path.display(),
            bytes_per_chunk = options.bytes_per_chunk,
            "created archive"
        );
        Ok(archive)
    }

    /// Open an existing archive with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ArchiveOptions::default())
    }

    /// Open an existing archive.
    ///
    /// The chunk size always comes from the archive header; the remaining
    /// options apply to this handle.
    ///
    /// # Errors
    ///
    /// Format errors for a bad magic, a truncated header or table, a chunk
    /// size of zero or above
    /// [`MAX_BYTES_PER_CHUNK`](hamarc_hamming::MAX_BYTES_PER_CHUNK), or a table whose
    /// offsets do not describe a gap-free payload region inside the file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::options().read(true).write(true).open(path)?;
        let file_len = file.metadata()?.len();

        let mut reader = BufReader::new(&mut file);
        let header = ArchiveHeader::read(&mut reader)?;

        let config = usize::try_from(header.bytes_per_chunk)
            .ok()
            .and_then(|n| ChunkConfig::new(n).ok())
            .ok_or_else(|| {
                HamArcError::invalid_header(format!(
                    "invalid bytes per chunk: {}",
                    header.bytes_per_chunk
                ))
            })?;
        let bytes_per_chunk = config.bytes_per_chunk;

        let table_end = header
            .file_count
            .checked_add(header.free_header_slack)
            .and_then(|slots| slots.checked_mul(ENTRY_SIZE))
            .and_then(|len| len.checked_add(HEADER_SIZE))
            .filter(|&end| end <= file_len)
            .ok_or_else(|| HamArcError::invalid_header("entry table exceeds archive size"))?;

        let mut entries = Vec::with_capacity(header.file_count as usize);
        for _ in 0..header.file_count {
            entries.push(FileEntry::read(&mut reader)?);
        }
        drop(reader);

        let codec = ChunkedCodec::new(config);
        validate_layout(table_end, &entries, file_len, &codec)?;

        tracing::debug!(
            path = %path.display(),
            file_count = header.file_count,
            free_header_slack = header.free_header_slack,
            bytes_per_chunk,
            "opened archive"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            entries,
            codec,
            options: ArchiveOptions {
                bytes_per_chunk,
                ..options
            },
        })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Chunk geometry of this archive.
    pub fn config(&self) -> &ChunkConfig {
        self.codec.config()
    }

    /// Options in effect for this handle.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Live entries, in payload order.
    pub fn list(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Number of live entries.
    pub fn file_count(&self) -> u64 {
        self.header.file_count
    }

    /// Number of free table slots.
    pub fn free_header_slack(&self) -> u64 {
        self.header.free_header_slack
    }

    /// First entry stored under `name`.
    pub fn entry(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Offset of the first payload byte.
    pub fn payload_start(&self) -> u64 {
        self.header.table_end()
    }

    /// One past the last payload byte.
    pub fn payload_end(&self) -> u64 {
        self.entries
            .last()
            .map_or_else(|| self.header.table_end(), FileEntry::end)
    }

    /// Re-check the table against the file on disk.
    pub fn check_layout(&self) -> Result<()> {
        if self.entries.len() as u64 != self.header.file_count {
            return Err(HamArcError::invalid_header(format!(
                "file_count {} but {} entries loaded",
                self.header.file_count,
                self.entries.len()
            )));
        }
        let file_len = self.file.metadata()?.len();
        validate_layout(self.header.table_end(), &self.entries, file_len, &self.codec)
    }

    /// Encode and append the given files.
    ///
    /// Only the base filename is stored. A source that cannot be opened, or
    /// that yields fewer bytes than its reported size, is recorded in the
    /// report and skipped; the others are still inserted.
    pub fn insert<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut sources = Vec::with_capacity(files.len());

        for path in files {
            let path = path.as_ref();
            match self.open_source(path) {
                Ok(source) => sources.push(source),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping source");
                    report.failed.push((path.display().to_string(), e.to_string()));
                }
            }
        }
        if sources.is_empty() {
            return Ok(report);
        }

        self.reserve_slots(sources.len() as u64)?;
        for source in sources {
            let mut reader = BufReader::new(source.file);
            match self.append_encoded(&source.name, &mut reader, source.size) {
                Ok(()) => report.processed.push(source.path),
                Err(e) => {
                    tracing::warn!(path = %source.path.display(), error = %e, "skipping source");
                    report
                        .failed
                        .push((source.path.display().to_string(), e.to_string()));
                }
            }
        }
        self.finish_append()?;

        tracing::info!(
            path = %self.path.display(),
            inserted = report.processed.len(),
            file_count = self.header.file_count,
            "insert complete"
        );
        Ok(report)
    }

    /// Encode `size` bytes from `reader` and append them as entry `name`.
    ///
    /// # Errors
    ///
    /// Fails if `reader` ends before `size` bytes. The archive is left as
    /// it was before the call, apart from possibly extra table slack.
    pub fn insert_reader<R: Read + ?Sized>(
        &mut self,
        name: &str,
        reader: &mut R,
        size: u64,
    ) -> Result<()> {
        self.reserve_slots(1)?;
        let appended = self.append_encoded(name, reader, size);
        self.finish_append()?;
        appended
    }

    /// Decode entries into `dest_dir`.
    ///
    /// An empty `names` slice extracts every entry. Names not present in
    /// the archive are reported as missing.
    pub fn extract<S, P>(&mut self, names: &[S], dest_dir: P) -> Result<BatchReport>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        let dest_dir = dest_dir.as_ref();
        fs::create_dir_all(dest_dir)?;

        let mut report = BatchReport::default();
        for entry in self.select(names, &mut report) {
            match self.extract_entry(&entry, dest_dir) {
                Ok((path, decoded)) => {
                    if !decoded.is_clean() {
                        tracing::warn!(
                            name = %entry.name,
                            corrupted = decoded.corrupted_chunks.len(),
                            "extracted with corrupted chunks zero-filled"
                        );
                    }
                    report.corrupted_chunks += decoded.corrupted_chunks.len() as u64;
                    report.processed.push(path);
                }
                Err(e) => {
                    tracing::error!(name = %entry.name, error = %e, "extraction failed");
                    report.failed.push((entry.name.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Decode every entry into `dest_dir`.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dest_dir: P) -> Result<BatchReport> {
        self.extract::<&str, P>(&[], dest_dir)
    }

    /// Decode one entry into memory.
    pub fn read_entry(&mut self, name: &str) -> Result<(Vec<u8>, DecodeReport)> {
        let entry = self
            .entry(name)
            .cloned()
            .ok_or_else(|| HamArcError::entry_not_found(name))?;
        let mut out = Vec::with_capacity(entry.plain_size as usize);
        let report = self.decode_entry(&entry, &mut out)?;
        Ok((out, report))
    }

    /// Decode the entry at `index` (in [`list`](Self::list) order) into `out`.
    ///
    /// Unlike [`read_entry`](Self::read_entry) this reaches every entry,
    /// including later ones that share a name with an earlier entry.
    pub fn decode_to<W: Write + ?Sized>(
        &mut self,
        index: usize,
        out: &mut W,
    ) -> Result<DecodeReport> {
        let entry = self
            .entries
            .get(index)
            .cloned()
            .ok_or_else(|| HamArcError::entry_not_found(format!("#{index}")))?;
        self.decode_entry(&entry, out)
    }

    /// Check the parity of every chunk of every entry without writing output.
    pub fn verify(&mut self) -> Result<Vec<(String, DecodeReport)>> {
        let mut results = Vec::with_capacity(self.entries.len());
        for index in 0..self.entries.len() {
            let entry = self.entries[index].clone();
            self.file.seek(SeekFrom::Start(entry.offset))?;
            let mut reader = BufReader::new(&mut self.file).take(entry.enc_size);
            let report = self
                .codec
                .verify_stream(&mut reader, entry.plain_size, entry.enc_size)?;
            results.push((entry.name, report));
        }
        Ok(results)
    }

    /// Remove entries, backing up their raw encoded bytes into `backup_dir`.
    ///
    /// For each name the first matching entry is removed, the payload after
    /// it is shifted back to close the gap, and the freed table slot becomes
    /// slack. An entry whose backup cannot be written is left in place.
    pub fn delete<S, P>(&mut self, names: &[S], backup_dir: P) -> Result<BatchReport>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        let backup_dir = backup_dir.as_ref();
        fs::create_dir_all(backup_dir)?;

        let mut report = BatchReport::default();
        for name in names {
            let name = name.as_ref();
            let Some(index) = self.entries.iter().position(|e| e.name == name) else {
                tracing::warn!(name, path = %self.path.display(), "no such entry to delete");
                report.missing.push(name.to_string());
                continue;
            };

            let entry = self.entries[index].clone();
            let backup = match self.backup_entry(&entry, backup_dir) {
                Ok(path) => path,
                Err(e) => {
                    tracing::error!(name, error = %e, "backup failed; entry kept");
                    report.failed.push((name.to_string(), e.to_string()));
                    continue;
                }
            };

            self.remove_entry(index)?;
            tracing::debug!(name, enc_size = entry.enc_size, "deleted entry");
            report.processed.push(backup);
        }

        tracing::info!(
            path = %self.path.display(),
            deleted = report.processed.len(),
            file_count = self.header.file_count,
            "delete complete"
        );
        Ok(report)
    }

    /// Flush the archive to disk and release it.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        tracing::debug!(path = %self.path.display(), "closed archive");
        Ok(())
    }

    fn open_source(&self, path: &Path) -> Result<Source> {
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file").into());
        }
        if fs::canonicalize(path)? == fs::canonicalize(&self.path)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot insert an archive into itself",
            )
            .into());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

        Ok(Source {
            path: path.to_path_buf(),
            name,
            file,
            size: meta.len(),
        })
    }

    /// Make sure at least `needed` free table slots exist.
    ///
    /// When the slack is too small the table grows to hold the new entries
    /// plus a fresh batch of slack, the payload region moves forward by the
    /// size difference and the table is rewritten to match.
    pub(crate) fn reserve_slots(&mut self, needed: u64) -> Result<()> {
        if self.header.free_header_slack >= needed {
            return Ok(());
        }

        let old_start = self.header.table_end();
        let old_end = self.payload_end();
        let new_slack = needed + self.options.slack_restock;
        let new_start = HEADER_SIZE + (self.header.file_count + new_slack) * ENTRY_SIZE;
        let delta = new_start - old_start;

        if old_end > old_start {
            shift_range(&mut self.file, old_start, old_end, delta as i64)?;
        }
        for entry in &mut self.entries {
            entry.offset += delta;
        }
        self.header.free_header_slack = new_slack;
        self.write_table()?;

        tracing::debug!(
            old_start,
            new_start,
            delta,
            free_header_slack = new_slack,
            "grew entry table"
        );
        Ok(())
    }

    /// Encode one payload at the end of the payload region and claim a slot.
    ///
    /// On error nothing is recorded; bytes already written past the old
    /// payload end are dropped by [`finish_append`](Self::finish_append).
    pub(crate) fn append_encoded<R: Read + ?Sized>(
        &mut self,
        name: &str,
        reader: &mut R,
        size: u64,
    ) -> Result<()> {
        debug_assert!(self.header.free_header_slack > 0);
        let offset = self.payload_end();
        let enc_size = self.codec.calc_encoded_size(size);

        self.file.seek(SeekFrom::Start(offset))?;
        let mut writer = BufWriter::new(&mut self.file);
        let written = self.codec.encode_stream(reader, size, &mut writer)?;
        writer.flush()?;
        drop(writer);
        if written != enc_size {
            return Err(HamArcError::size_mismatch(enc_size, written));
        }

        if name.len() > MAX_NAME_BYTES {
            tracing::warn!(name, stored = truncate_name(name), "filename truncated");
        }
        self.entries.push(FileEntry::new(name, size, enc_size, offset));
        self.header.file_count += 1;
        self.header.free_header_slack -= 1;
        tracing::debug!(name, plain_size = size, enc_size, offset, "inserted entry");
        Ok(())
    }

    /// Persist the table and cut off anything past the payload end.
    pub(crate) fn finish_append(&mut self) -> Result<()> {
        self.write_table()?;
        self.file.set_len(self.payload_end())?;
        Ok(())
    }

    fn remove_entry(&mut self, index: usize) -> Result<()> {
        let end = self.payload_end();
        let removed = self.entries.remove(index);
        let gap = removed.enc_size;

        if gap > 0 && removed.end() < end {
            shift_range(&mut self.file, removed.end(), end, -(gap as i64))?;
        }
        for entry in &mut self.entries[index..] {
            entry.offset -= gap;
        }
        self.header.file_count -= 1;
        self.header.free_header_slack += 1;

        self.write_table()?;
        self.file.set_len(self.payload_end())?;
        Ok(())
    }

    fn select<S: AsRef<str>>(&self, names: &[S], report: &mut BatchReport) -> Vec<FileEntry> {
        if names.is_empty() {
            return self.entries.clone();
        }
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let found = self.entry(name).cloned();
                if found.is_none() {
                    tracing::warn!(name, path = %self.path.display(), "no such entry");
                    report.missing.push(name.to_string());
                }
                found
            })
            .collect()
    }

    fn extract_entry(
        &mut self,
        entry: &FileEntry,
        dest_dir: &Path,
    ) -> Result<(PathBuf, DecodeReport)> {
        let out_path = dest_dir.join(safe_name(&entry.name)?);
        let mut out = BufWriter::new(File::create(&out_path)?);
        let result = self
            .decode_entry(entry, &mut out)
            .and_then(|report| out.flush().map(|()| report).map_err(HamArcError::from));
        drop(out);

        match result {
            Ok(report) => Ok((out_path, report)),
            Err(e) => {
                // Drop partial output.
                let _ = fs::remove_file(&out_path);
                Err(e)
            }
        }
    }

    fn decode_entry<W: Write + ?Sized>(
        &mut self,
        entry: &FileEntry,
        out: &mut W,
    ) -> Result<DecodeReport> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut reader = BufReader::new(&mut self.file).take(entry.enc_size);
        self.codec.decode_stream(
            &mut reader,
            entry.plain_size,
            entry.enc_size,
            out,
            self.options.corruption_policy,
        )
    }

    fn backup_entry(&mut self, entry: &FileEntry, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(safe_name(&entry.name)?);
        let mut out = BufWriter::new(File::create(&path)?);

        self.file.seek(SeekFrom::Start(entry.offset))?;
        let copied = io::copy(&mut (&mut self.file).take(entry.enc_size), &mut out)?;
        out.flush()?;
        if copied != entry.enc_size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("payload of {} truncated", entry.name),
            )
            .into());
        }
        Ok(path)
    }

    fn write_table(&mut self) -> Result<()> {
        let mut writer = BufWriter::new(&mut self.file);
        writer.seek(SeekFrom::Start(0))?;
        self.header.write(&mut writer)?;
        for entry in &self.entries {
            entry.write(&mut writer)?;
        }
        let blank = [0u8; ENTRY_SIZE as usize];
        for _ in 0..self.header.free_header_slack {
            writer.write_all(&blank)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reject names that would leave the destination directory.
fn safe_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(HamArcError::path_traversal(name));
    }
    Ok(name)
}

fn validate_layout(
    table_end: u64,
    entries: &[FileEntry],
    file_len: u64,
    codec: &ChunkedCodec,
) -> Result<()> {
    let mut expected = table_end;
    for (i, entry) in entries.iter().enumerate() {
        if entry.offset != expected {
            return Err(HamArcError::invalid_header(format!(
                "entry {} ({}) at offset {}, expected {}",
                i, entry.name, entry.offset, expected
            )));
        }
        let enc = codec.calc_encoded_size(entry.plain_size);
        if enc != entry.enc_size {
            return Err(HamArcError::invalid_header(format!(
                "entry {} ({}) has encoded size {}, expected {}",
                i, entry.name, entry.enc_size, enc
            )));
        }
        expected = entry
            .offset
            .checked_add(entry.enc_size)
            .ok_or_else(|| HamArcError::invalid_header("entry size overflow"))?;
    }
    if expected > file_len {
        return Err(HamArcError::invalid_header(format!(
            "payload ends at {} but archive is {} bytes",
            expected, file_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamarc_hamming::MAX_BYTES_PER_CHUNK;
    use tempfile::TempDir;

    fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_create_writes_empty_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ham");
        let archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        assert_eq!(archive.file_count(), 0);
        assert_eq!(archive.free_header_slack(), 0);
        assert_eq!(archive.payload_start(), HEADER_SIZE);
        archive.close().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_SIZE);
        assert_eq!(&bytes[..3], b"HAM");
    }

    #[test]
    fn test_create_opens_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ham");
        let src = write_source(dir.path(), "x.bin", b"xyz");
        {
            let mut archive =
                HamArchive::create(&path, ArchiveOptions::new().with_chunk_size(7)).unwrap();
            archive.insert(&[&src]).unwrap();
            archive.close().unwrap();
        }
        // Chunk size in options is ignored for an existing archive.
        let archive = HamArchive::create(&path, ArchiveOptions::new().with_chunk_size(50)).unwrap();
        assert_eq!(archive.config().bytes_per_chunk, 7);
        assert_eq!(archive.file_count(), 1);
    }

    #[test]
    fn test_open_rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.ham");
        let mut bytes = ArchiveHeader::new(100).to_bytes();
        bytes[1] = b'X';
        fs::write(&path, bytes).unwrap();

        let err = HamArchive::open(&path).unwrap_err();
        assert!(matches!(err, HamArcError::InvalidMagic { .. }));
    }

    #[test]
    fn test_open_rejects_zero_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.ham");
        fs::write(&path, ArchiveHeader::new(0).to_bytes()).unwrap();
        let err = HamArchive::open(&path).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_open_rejects_huge_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.ham");
        fs::write(&path, ArchiveHeader::new(1 << 62).to_bytes()).unwrap();
        let err = HamArchive::open(&path).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, HamArcError::InvalidHeader { .. }));

        fs::write(&path, ArchiveHeader::new(MAX_BYTES_PER_CHUNK as u64 + 1).to_bytes()).unwrap();
        assert!(HamArchive::open(&path).unwrap_err().is_format_error());
    }

    #[test]
    fn test_open_rejects_truncated_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.ham");
        let mut hdr = ArchiveHeader::new(100);
        hdr.file_count = 3;
        fs::write(&path, hdr.to_bytes()).unwrap();
        let err = HamArchive::open(&path).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = HamArchive::open(dir.path().join("nope.ham")).unwrap_err();
        assert!(matches!(err, HamArcError::Io(_)));
    }

    #[test]
    fn test_insert_uses_slack_without_shifting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.ham");
        let a = write_source(dir.path(), "a", b"first");
        let b = write_source(dir.path(), "b", b"second");

        let mut archive = HamArchive::create(&path, ArchiveOptions::new().with_slack_restock(4)).unwrap();
        archive.insert(&[&a]).unwrap();
        assert_eq!(archive.free_header_slack(), 4);
        let first_offset = archive.list()[0].offset;

        archive.insert(&[&b]).unwrap();
        assert_eq!(archive.free_header_slack(), 3);
        assert_eq!(archive.list()[0].offset, first_offset);
        archive.check_layout().unwrap();
    }

    #[test]
    fn test_missing_source_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.ham");
        let a = write_source(dir.path(), "a.txt", b"alpha");
        let ghost = dir.path().join("ghost.txt");

        let mut archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        let report = archive.insert(&[ghost, a.clone()]).unwrap();
        assert_eq!(report.processed, vec![a]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(archive.file_count(), 1);
    }

    #[test]
    fn test_short_reader_leaves_archive_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.ham");
        let a = write_source(dir.path(), "a", b"kept across a failed insert");

        let mut archive =
            HamArchive::create(&path, ArchiveOptions::new().with_slack_restock(0)).unwrap();
        archive.insert(&[&a]).unwrap();
        assert_eq!(archive.free_header_slack(), 0);

        // Forces a table grow, then the source runs dry.
        let err = archive
            .insert_reader("liar", &mut &b"short"[..], 100)
            .unwrap_err();
        assert!(matches!(err, HamArcError::Io(_)));
        assert_eq!(archive.file_count(), 1);
        archive.check_layout().unwrap();
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            archive.payload_end()
        );
        archive.close().unwrap();

        let mut archive = HamArchive::open(&path).unwrap();
        assert_eq!(archive.file_count(), 1);
        let (data, report) = archive.read_entry("a").unwrap();
        assert_eq!(data, b"kept across a failed insert");
        assert!(report.is_clean());
    }

    #[test]
    fn test_failed_source_mid_batch_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.ham");
        let a = write_source(dir.path(), "a", b"existing payload");

        let mut archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        archive.insert(&[&a]).unwrap();

        // Same sequence `insert` runs for a two-source batch whose first
        // source is shorter than its stat size.
        archive.reserve_slots(2).unwrap();
        assert!(archive.append_encoded("broken", &mut &[7u8; 3][..], 50).is_err());
        archive
            .append_encoded("good", &mut &b"second payload"[..], 14)
            .unwrap();
        archive.finish_append().unwrap();

        let names: Vec<_> = archive.list().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "good"]);
        archive.check_layout().unwrap();
        archive.close().unwrap();

        let mut archive = HamArchive::open(&path).unwrap();
        assert_eq!(archive.read_entry("a").unwrap().0, b"existing payload");
        assert_eq!(archive.read_entry("good").unwrap().0, b"second payload");
    }

    #[test]
    fn test_decode_to_reaches_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.ham");
        let mut archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        archive.insert_reader("same", &mut &b"one"[..], 3).unwrap();
        archive.insert_reader("same", &mut &b"two"[..], 3).unwrap();

        let mut out = Vec::new();
        archive.decode_to(1, &mut out).unwrap();
        assert_eq!(out, b"two");
        assert!(matches!(
            archive.decode_to(2, &mut Vec::new()).unwrap_err(),
            HamArcError::EntryNotFound { .. }
        ));
    }

    #[test]
    fn test_insert_archive_into_itself_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("self.ham");
        let mut archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        let report = archive.insert(&[&path]).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(archive.file_count(), 0);
    }

    #[test]
    fn test_empty_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("e.ham");
        let empty = write_source(dir.path(), "empty", b"");
        let full = write_source(dir.path(), "full", b"payload");

        let mut archive = HamArchive::create(&path, ArchiveOptions::default()).unwrap();
        archive.insert(&[&empty, &full]).unwrap();
        assert_eq!(archive.list()[0].enc_size, 0);
        assert_eq!(archive.list()[1].offset, archive.list()[0].offset);

        let (data, _) = archive.read_entry("empty").unwrap();
        assert!(data.is_empty());
        let (data, _) = archive.read_entry("full").unwrap();
        assert_eq!(data, b"payload");
    }

    #[test]
    fn test_read_entry_not_found() {
        let dir = TempDir::new().unwrap();
        let mut archive =
            HamArchive::create(dir.path().join("n.ham"), ArchiveOptions::default()).unwrap();
        let err = archive.read_entry("nothing").unwrap_err();
        assert!(matches!(err, HamArcError::EntryNotFound { .. }));
    }

    #[test]
    fn test_safe_name() {
        assert!(safe_name("report.pdf").is_ok());
        assert!(safe_name("..").is_err());
        assert!(safe_name("../etc/passwd").is_err());
        assert!(safe_name("a\\b").is_err());
        assert!(safe_name("").is_err());
    }

    #[test]
    fn test_batch_report_merge() {
        let mut a = BatchReport {
            processed: vec![PathBuf::from("x")],
            corrupted_chunks: 1,
            ..Default::default()
        };
        let b = BatchReport {
            missing: vec!["y".to_string()],
            corrupted_chunks: 2,
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.corrupted_chunks, 3);
        assert!(!a.is_complete());
    }
}
