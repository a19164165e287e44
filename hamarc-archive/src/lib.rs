//! # HamArc Archive
//!
//! The HAM container: a fixed header, a growable entry table and a
//! gap-free region of Hamming-coded payloads.
//!
//! - **Insert**: files are encoded chunk by chunk and appended; the table
//!   grows in place by shifting the payload when its free slots run out
//! - **Extract**: payloads are decoded back to files, damaged chunks are
//!   reported and zero-filled (or rejected in strict mode)
//! - **Delete**: raw payloads are backed up, then the tail of the archive
//!   is shifted back over the gap
//! - **Concat**: other archives are decoded and re-encoded into one
//!
//! ## Example
//!
//! ```rust,no_run
//! use hamarc_archive::{ArchiveOptions, HamArchive};
//!
//! let mut archive = HamArchive::create("backup.ham", ArchiveOptions::default()).unwrap();
//! archive.insert(&["notes.txt", "photo.jpg"]).unwrap();
//!
//! for entry in archive.list() {
//!     println!("{} {} -> {}", entry.name, entry.plain_size, entry.enc_size);
//! }
//!
//! let report = archive.extract(&["notes.txt"], "restored").unwrap();
//! assert!(report.is_complete());
//! archive.close().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod concat;
pub mod ham;

// Re-exports
pub use concat::concat;
pub use ham::{
    ArchiveHeader, ArchiveOptions, BatchReport, DEFAULT_SLACK_RESTOCK, ENTRY_SIZE, FileEntry,
    HEADER_SIZE, HamArchive, MAGIC,
};
pub use hamarc_hamming::{CorruptionPolicy, DEFAULT_BYTES_PER_CHUNK};
