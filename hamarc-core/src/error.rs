//! Error types for HamArc operations.
//!
//! This module provides a single error type covering every failure mode of
//! the archiver: I/O failures (including short reads and writes), archive
//! format violations, missing entries and Hamming-detected corruption.

use std::io;
use thiserror::Error;

/// The main error type for HamArc operations.
#[derive(Debug, Error)]
pub enum HamArcError {
    /// I/O error from the underlying file, including short reads and writes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in archive header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Invalid header or entry table.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },

    /// Entry name would escape the extraction directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious name.
        path: String,
    },

    /// A Hamming codeword failed its parity check.
    #[error("Corrupted chunk {chunk} at encoded offset {offset}")]
    Corrupted {
        /// Zero-based index of the chunk within its entry.
        chunk: u64,
        /// Byte offset of the chunk within the entry's encoded payload.
        offset: u64,
    },

    /// Encoded length disagrees with the length derived from the plaintext size.
    #[error("Encoded size mismatch: expected {expected} bytes, found {found}")]
    SizeMismatch {
        /// Size derived from the chunk configuration.
        expected: u64,
        /// Size recorded or supplied.
        found: u64,
    },

    /// Requested byte-range shift is not representable.
    #[error("Invalid shift of [{start}, {end}) by {delta}")]
    InvalidShift {
        /// First byte of the range.
        start: u64,
        /// One past the last byte of the range.
        end: u64,
        /// Signed displacement.
        delta: i64,
    },

    /// Chunk size must be at least one byte.
    #[error("Invalid chunk size: {size}")]
    InvalidChunkSize {
        /// Offending chunk size in bytes.
        size: u64,
    },

    /// Bit index addresses a byte outside a bit vector.
    #[error("Bit index {index} out of range for {bit_count}-bit vector")]
    BitIndexOutOfRange {
        /// Requested bit index.
        index: usize,
        /// Length of the vector in bits.
        bit_count: usize,
    },
}

/// Result type alias for HamArc operations.
pub type Result<T> = std::result::Result<T, HamArcError>;

impl HamArcError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create a corrupted chunk error.
    pub fn corrupted(chunk: u64, offset: u64) -> Self {
        Self::Corrupted { chunk, offset }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: u64, found: u64) -> Self {
        Self::SizeMismatch { expected, found }
    }

    /// Create an invalid shift error.
    pub fn invalid_shift(start: u64, end: u64, delta: i64) -> Self {
        Self::InvalidShift { start, end, delta }
    }

    /// Returns true for errors raised by an on-disk format violation.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidMagic { .. } | Self::InvalidHeader { .. })
    }
}
