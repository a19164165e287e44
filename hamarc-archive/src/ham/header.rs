//! HAM on-disk structures.
//!
//! ```text
//! offset 0    ArchiveHeader (32 bytes)
//!               [0..3)   magic "HAM"
//!               [3..8)   zero padding
//!               [8..16)  file_count         u64 LE
//!               [16..24) free_header_slack  u64 LE
//!               [24..32) bytes_per_chunk    u64 LE
//! offset 32   FileEntry x (file_count + free_header_slack), 128 bytes each
//!               [0..8)    plain_size  u64 LE
//!               [8..16)   enc_size    u64 LE
//!               [16..24)  offset      u64 LE
//!               [24..124) filename, NUL-padded
//!               [124..128) zero padding
//! then        payload of entry 0, entry 1, ... with no gaps
//! ```

use hamarc_core::{HamArcError, Result};
use std::io::{self, Read, Write};

/// HAM magic: "HAM"
pub const MAGIC: [u8; 3] = *b"HAM";

/// Size of the fixed archive header in bytes.
pub const HEADER_SIZE: u64 = 32;

/// Size of one entry-table slot in bytes.
pub const ENTRY_SIZE: u64 = 128;

/// Width of the filename field, including the terminating NUL.
pub const NAME_LEN: usize = 100;

/// Longest filename that can be stored, in bytes.
pub const MAX_NAME_BYTES: usize = NAME_LEN - 1;

/// The fixed header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Number of live entries in the table.
    pub file_count: u64,
    /// Reserved, unused table slots after the live entries.
    pub free_header_slack: u64,
    /// Plaintext bytes per Hamming chunk.
    pub bytes_per_chunk: u64,
}

impl ArchiveHeader {
    /// Header of an empty archive.
    pub fn new(bytes_per_chunk: u64) -> Self {
        Self {
            file_count: 0,
            free_header_slack: 0,
            bytes_per_chunk,
        }
    }

    /// Read and validate a header.
    ///
    /// A short read is reported as a format error rather than an I/O error.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        read_exact_or(reader, &mut buf, "truncated archive header")?;

        if buf[0..3] != MAGIC {
            return Err(HamArcError::invalid_magic(MAGIC.to_vec(), buf[0..3].to_vec()));
        }

        Ok(Self {
            file_count: le_u64(&buf[8..16]),
            free_header_slack: le_u64(&buf[16..24]),
            bytes_per_chunk: le_u64(&buf[24..32]),
        })
    }

    /// Serialize to the fixed on-disk form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[0..3].copy_from_slice(&MAGIC);
        buf[8..16].copy_from_slice(&self.file_count.to_le_bytes());
        buf[16..24].copy_from_slice(&self.free_header_slack.to_le_bytes());
        buf[24..32].copy_from_slice(&self.bytes_per_chunk.to_le_bytes());
        buf
    }

    /// Write the header.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Total table slots, live and free.
    pub fn table_slots(&self) -> u64 {
        self.file_count + self.free_header_slack
    }

    /// Offset of the first payload byte.
    pub fn table_end(&self) -> u64 {
        HEADER_SIZE + self.table_slots() * ENTRY_SIZE
    }
}

/// One slot of the entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Original file size in bytes.
    pub plain_size: u64,
    /// Size of the encoded payload in bytes.
    pub enc_size: u64,
    /// Absolute offset of the payload in the archive.
    pub offset: u64,
    /// Base filename.
    pub name: String,
}

impl FileEntry {
    /// Create an entry, truncating `name` to [`MAX_NAME_BYTES`].
    pub fn new(name: &str, plain_size: u64, enc_size: u64, offset: u64) -> Self {
        Self {
            plain_size,
            enc_size,
            offset,
            name: truncate_name(name).to_string(),
        }
    }

    /// One past the last payload byte.
    pub fn end(&self) -> u64 {
        self.offset + self.enc_size
    }

    /// Read one table slot.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; ENTRY_SIZE as usize];
        read_exact_or(reader, &mut buf, "truncated entry table")?;

        let name_field = &buf[24..24 + NAME_LEN];
        let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);

        Ok(Self {
            plain_size: le_u64(&buf[0..8]),
            enc_size: le_u64(&buf[8..16]),
            offset: le_u64(&buf[16..24]),
            name: String::from_utf8_lossy(&name_field[..name_len]).into_owned(),
        })
    }

    /// Serialize to the fixed on-disk form.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE as usize] {
        let mut buf = [0u8; ENTRY_SIZE as usize];
        buf[0..8].copy_from_slice(&self.plain_size.to_le_bytes());
        buf[8..16].copy_from_slice(&self.enc_size.to_le_bytes());
        buf[16..24].copy_from_slice(&self.offset.to_le_bytes());
        let name = truncate_name(&self.name).as_bytes();
        buf[24..24 + name.len()].copy_from_slice(name);
        buf
    }

    /// Write the entry.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// Longest prefix of `name` that fits the filename field.
///
/// Cuts on a character boundary so the stored name stays valid UTF-8.
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[inline]
fn le_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

fn read_exact_or<R: Read>(reader: &mut R, buf: &mut [u8], message: &str) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(HamArcError::invalid_header(message))
        }
        Err(e) => Err(e.into()),
    }
}
