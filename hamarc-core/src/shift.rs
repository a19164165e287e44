//! In-place relocation of a byte range inside a seekable stream.
//!
//! [`shift_range`] moves `[start, end)` to `[start + delta, end + delta)`
//! using a fixed-size working buffer, no matter how large the range is.
//! The archive uses it to open room for a larger entry table and to close
//! the gap left by a deleted entry.
//!
//! Copy order depends on direction so that no byte is overwritten before it
//! has been read:
//!
//! ```text
//! delta > 0:   [start ........ end)            copy high -> low
//!                    [start+d ........ end+d)
//!
//! delta < 0:           [start ........ end)    copy low -> high
//!              [start-d ........ end-d)
//! ```
//!
//! Bytes of the source range that are not covered by the destination keep
//! their old contents; the caller owns that region afterwards.

use crate::error::{HamArcError, Result};
use std::io::{Read, Seek, SeekFrom, Write};

/// Size of the working buffer used by [`shift_range`].
pub const SHIFT_BUFFER_SIZE: usize = 4096;

/// Move `[start, end)` by `delta` bytes within `stream`.
///
/// When `delta > 0` the stream is first extended (zero-filled) to cover
/// `end + delta`. Any short read or write surfaces as an I/O error.
///
/// # Errors
///
/// Returns [`HamArcError::InvalidShift`] if `end <= start` or the
/// destination would start before offset 0.
pub fn shift_range<S>(stream: &mut S, start: u64, end: u64, delta: i64) -> Result<()>
where
    S: Read + Write + Seek,
{
    let mut buf = [0u8; SHIFT_BUFFER_SIZE];
    shift_range_with_buffer(stream, start, end, delta, &mut buf)
}

/// Same as [`shift_range`], but with a caller-provided working buffer.
///
/// # Panics
///
/// Panics if `buf` is empty.
pub fn shift_range_with_buffer<S>(
    stream: &mut S,
    start: u64,
    end: u64,
    delta: i64,
    buf: &mut [u8],
) -> Result<()>
where
    S: Read + Write + Seek,
{
    assert!(!buf.is_empty(), "shift buffer must not be empty");

    if end <= start {
        return Err(HamArcError::invalid_shift(start, end, delta));
    }
    if delta == 0 {
        return Ok(());
    }

    let distance = delta.unsigned_abs();
    tracing::trace!(start, end, delta, "shifting byte range");

    if delta > 0 {
        zero_fill(stream, end, distance, buf)?;

        let mut pos = end;
        while pos > start {
            let n = chunk_len(pos - start, buf.len());
            pos -= n as u64;
            copy_chunk(stream, pos, pos + distance, &mut buf[..n])?;
        }
    } else {
        if start < distance {
            return Err(HamArcError::invalid_shift(start, end, delta));
        }

        let mut pos = start;
        while pos < end {
            let n = chunk_len(end - pos, buf.len());
            copy_chunk(stream, pos, pos - distance, &mut buf[..n])?;
            pos += n as u64;
        }
    }

    Ok(())
}

#[inline]
fn chunk_len(remaining: u64, cap: usize) -> usize {
    remaining.min(cap as u64) as usize
}

fn copy_chunk<S>(stream: &mut S, from: u64, to: u64, chunk: &mut [u8]) -> Result<()>
where
    S: Read + Write + Seek,
{
    stream.seek(SeekFrom::Start(from))?;
    stream.read_exact(chunk)?;
    stream.seek(SeekFrom::Start(to))?;
    stream.write_all(chunk)?;
    Ok(())
}

fn zero_fill<S>(stream: &mut S, at: u64, len: u64, buf: &mut [u8]) -> Result<()>
where
    S: Write + Seek,
{
    buf.fill(0);
    stream.seek(SeekFrom::Start(at))?;
    let mut left = len;
    while left > 0 {
        let n = chunk_len(left, buf.len());
        stream.write_all(&buf[..n])?;
        left -= n as u64;
    }
    Ok(())
}
