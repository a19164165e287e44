//! Chunk geometry for stream encoding.

use crate::hamming::encoded_bits_for;
use hamarc_core::{HamArcError, Result};

/// Default plaintext window size in bytes.
pub const DEFAULT_BYTES_PER_CHUNK: usize = 100;

/// Largest accepted plaintext window size in bytes (1 MiB).
pub const MAX_BYTES_PER_CHUNK: usize = 1 << 20;

/// Chunk geometry derived from a plaintext window size.
///
/// A `ChunkConfig` is a plain value: every archive owns one and passes it to
/// every codec call, so archives with different chunk sizes never share
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Plaintext bytes per full chunk.
    pub bytes_per_chunk: usize,
    /// Plaintext bits per full chunk.
    pub bits_per_chunk: usize,
    /// Encoded bytes per full chunk (codeword rounded up to whole bytes).
    pub enc_bytes_per_chunk: usize,
    /// Encoded bits per full chunk.
    pub enc_bits_per_chunk: usize,
}

impl ChunkConfig {
    /// Derive the geometry for `bytes_per_chunk`-byte windows.
    ///
    /// # Errors
    ///
    /// Returns [`HamArcError::InvalidChunkSize`] for a zero window or one
    /// larger than [`MAX_BYTES_PER_CHUNK`].
    pub fn new(bytes_per_chunk: usize) -> Result<Self> {
        if bytes_per_chunk == 0 || bytes_per_chunk > MAX_BYTES_PER_CHUNK {
            return Err(HamArcError::InvalidChunkSize {
                size: bytes_per_chunk as u64,
            });
        }
        Ok(Self::derive(bytes_per_chunk))
    }

    /// Geometry for a window already known to be in range.
    fn derive(bytes_per_chunk: usize) -> Self {
        let bits_per_chunk = bytes_per_chunk * 8;
        let enc_bits_per_chunk = encoded_bits_for(bits_per_chunk);
        Self {
            bytes_per_chunk,
            bits_per_chunk,
            enc_bytes_per_chunk: enc_bits_per_chunk.div_ceil(8),
            enc_bits_per_chunk,
        }
    }

    /// Split a plaintext length into `(full_chunks, tail_bytes)`.
    ///
    /// The tail always holds between 1 and `bytes_per_chunk` bytes, so an
    /// exact multiple ends with a full-size tail rather than an empty one.
    /// Only an empty input yields `(0, 0)`.
    pub fn split(&self, plain_len: u64) -> (u64, usize) {
        if plain_len == 0 {
            return (0, 0);
        }
        let chunk = self.bytes_per_chunk as u64;
        let full = (plain_len - 1) / chunk;
        (full, (plain_len - full * chunk) as usize)
    }

    /// Encoded size of a final chunk carrying `tail_bytes` plaintext bytes.
    pub fn encoded_tail_len(&self, tail_bytes: usize) -> usize {
        match tail_bytes {
            0 => 0,
            n if n == self.bytes_per_chunk => self.enc_bytes_per_chunk,
            n => encoded_bits_for(n * 8).div_ceil(8),
        }
    }

    /// Number of codewords a plaintext of `plain_len` bytes occupies.
    pub fn chunk_count(&self, plain_len: u64) -> u64 {
        plain_len.div_ceil(self.bytes_per_chunk as u64)
    }

    /// Size in bytes of the encoded form of `plain_len` plaintext bytes.
    ///
    /// Full chunks contribute `enc_bytes_per_chunk` each; the remainder
    /// contributes the byte length of its own, shorter codeword.
    pub fn calc_encoded_size(&self, plain_len: u64) -> u64 {
        let chunk = self.bytes_per_chunk as u64;
        let full = plain_len / chunk;
        let rest = (plain_len % chunk) as usize;
        let rest_enc = if rest == 0 {
            0
        } else {
            encoded_bits_for(rest * 8).div_ceil(8) as u64
        };
        full * self.enc_bytes_per_chunk as u64 + rest_enc
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::derive(DEFAULT_BYTES_PER_CHUNK)
    }
}
