//! Chunked Hamming encoding of byte streams.
//!
//! A plaintext of `L` bytes is cut into windows of `bytes_per_chunk` bytes.
//! Every window except the last is encoded with the full-size codec and
//! written as `enc_bytes_per_chunk` bytes. The last window carries between
//! 1 and `bytes_per_chunk` bytes and is encoded as its own codeword, sized
//! for exactly that many bits.
//!
//! ```text
//! plain:   | C bytes | C bytes | ... | 1..=C bytes |
//! encoded: | E bytes | E bytes | ... | enc(tail)   |
//! ```
//!
//! Decoding needs only the plaintext length to recover the same split.

use crate::config::ChunkConfig;
use crate::hamming::HammingCodec;
use hamarc_core::{BitVector, HamArcError, Result};
use std::io::{self, Read, Write};

/// What to do when a codeword fails its parity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptionPolicy {
    /// Log the chunk, emit zero bytes in its place and keep going.
    #[default]
    Skip,
    /// Stop and return [`HamArcError::Corrupted`].
    Fail,
}

/// Outcome of decoding one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Number of codewords processed.
    pub chunks: u64,
    /// Indices of codewords whose syndrome was nonzero.
    pub corrupted_chunks: Vec<u64>,
    /// Plaintext bytes written.
    pub bytes_written: u64,
}

impl DecodeReport {
    /// True if every codeword passed its parity check.
    pub fn is_clean(&self) -> bool {
        self.corrupted_chunks.is_empty()
    }
}

/// Stream encoder/decoder bound to one [`ChunkConfig`].
#[derive(Debug, Clone)]
pub struct ChunkedCodec {
    config: ChunkConfig,
    full: HammingCodec,
}

impl ChunkedCodec {
    /// Create a codec for the given geometry.
    pub fn new(config: ChunkConfig) -> Self {
        Self {
            config,
            full: HammingCodec::new(config.bits_per_chunk),
        }
    }

    /// The geometry this codec was built for.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Size in bytes of the encoded form of `plain_len` bytes.
    pub fn calc_encoded_size(&self, plain_len: u64) -> u64 {
        self.config.calc_encoded_size(plain_len)
    }

    fn tail_codec(&self, tail_bytes: usize) -> HammingCodec {
        if tail_bytes == self.config.bytes_per_chunk {
            self.full.clone()
        } else {
            HammingCodec::new(tail_bytes * 8)
        }
    }

    /// Encode `input_len` bytes read from `input` into `output`.
    ///
    /// Returns the number of encoded bytes written, which always equals
    /// [`calc_encoded_size(input_len)`](Self::calc_encoded_size).
    pub fn encode_stream<R, W>(&self, input: &mut R, input_len: u64, output: &mut W) -> Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let (full_chunks, tail) = self.config.split(input_len);
        let mut data = BitVector::new(self.config.bits_per_chunk);
        let mut written = 0u64;

        for _ in 0..full_chunks {
            input.read_exact(data.as_bytes_mut())?;
            let code = self.full.encode(&data);
            debug_assert_eq!(code.byte_len(), self.config.enc_bytes_per_chunk);
            output.write_all(code.as_bytes())?;
            written += code.byte_len() as u64;
        }

        if tail > 0 {
            let codec = self.tail_codec(tail);
            let mut last = BitVector::new(tail * 8);
            input.read_exact(last.as_bytes_mut())?;
            let code = codec.encode(&last);
            output.write_all(code.as_bytes())?;
            written += code.byte_len() as u64;
        }

        Ok(written)
    }

    /// Decode an encoded stream back into `output`.
    ///
    /// `plain_len` is the original plaintext length and `encoded_len` the
    /// number of encoded bytes available in `input`. Corrupted codewords are
    /// handled according to `policy`; with [`CorruptionPolicy::Skip`] the
    /// output always has exactly `plain_len` bytes.
    ///
    /// # Errors
    ///
    /// [`HamArcError::SizeMismatch`] if `encoded_len` does not match the
    /// plaintext length, [`HamArcError::Corrupted`] under
    /// [`CorruptionPolicy::Fail`], or any I/O error.
    pub fn decode_stream<R, W>(
        &self,
        input: &mut R,
        plain_len: u64,
        encoded_len: u64,
        output: &mut W,
        policy: CorruptionPolicy,
    ) -> Result<DecodeReport>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let expected = self.calc_encoded_size(plain_len);
        if expected != encoded_len {
            return Err(HamArcError::size_mismatch(expected, encoded_len));
        }

        let (full_chunks, tail) = self.config.split(plain_len);
        let mut report = DecodeReport::default();
        let mut code = BitVector::new(self.config.enc_bits_per_chunk);
        let mut offset = 0u64;

        for index in 0..full_chunks {
            input.read_exact(code.as_bytes_mut())?;
            self.emit(&self.full, &code, index, offset, output, policy, &mut report)?;
            offset += self.config.enc_bytes_per_chunk as u64;
        }

        if tail > 0 {
            let codec = self.tail_codec(tail);
            let mut last = BitVector::new(codec.code_bits());
            input.read_exact(last.as_bytes_mut())?;
            self.emit(&codec, &last, full_chunks, offset, output, policy, &mut report)?;
        }

        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit<W>(
        &self,
        codec: &HammingCodec,
        code: &BitVector,
        index: u64,
        offset: u64,
        output: &mut W,
        policy: CorruptionPolicy,
        report: &mut DecodeReport,
    ) -> Result<()>
    where
        W: Write + ?Sized,
    {
        report.chunks += 1;
        let plain_bytes = codec.data_bits() / 8;

        match codec.decode(code) {
            Some(data) => output.write_all(data.as_bytes())?,
            None => {
                tracing::error!(
                    chunk = index,
                    offset,
                    syndrome = codec.syndrome(code),
                    "Hamming parity check failed"
                );
                if policy == CorruptionPolicy::Fail {
                    return Err(HamArcError::corrupted(index, offset));
                }
                report.corrupted_chunks.push(index);
                output.write_all(&vec![0u8; plain_bytes])?;
            }
        }

        report.bytes_written += plain_bytes as u64;
        Ok(())
    }

    /// Decode into a sink, only checking parity.
    pub fn verify_stream<R>(&self, input: &mut R, plain_len: u64, encoded_len: u64) -> Result<DecodeReport>
    where
        R: Read + ?Sized,
    {
        self.decode_stream(input, plain_len, encoded_len, &mut io::sink(), CorruptionPolicy::Skip)
    }

    /// Encode an in-memory buffer.
    pub fn encode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.calc_encoded_size(data.len() as u64) as usize);
        let mut input = data;
        self.encode_stream(&mut input, data.len() as u64, &mut out)?;
        Ok(out)
    }

    /// Decode an in-memory buffer produced by [`encode_bytes`](Self::encode_bytes).
    pub fn decode_bytes(
        &self,
        encoded: &[u8],
        plain_len: u64,
        policy: CorruptionPolicy,
    ) -> Result<(Vec<u8>, DecodeReport)> {
        let mut out = Vec::with_capacity(plain_len as usize);
        let mut input = encoded;
        let report = self.decode_stream(&mut input, plain_len, encoded.len() as u64, &mut out, policy)?;
        Ok((out, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 + 11) as u8).collect()
    }

    #[test]
    fn test_roundtrip_chunk_boundaries() {
        for chunk in [1usize, 2, 5, 16, 100] {
            let codec = ChunkedCodec::new(ChunkConfig::new(chunk).unwrap());
            for len in [1usize, 2, chunk - 1, chunk, chunk + 1, 3 * chunk, 3 * chunk + 2, 257] {
                if len == 0 {
                    continue;
                }
                let data = sample(len);
                let encoded = codec.encode_bytes(&data).unwrap();
                assert_eq!(encoded.len() as u64, codec.calc_encoded_size(len as u64));

                let (decoded, report) = codec
                    .decode_bytes(&encoded, len as u64, CorruptionPolicy::Fail)
                    .unwrap();
                assert_eq!(decoded, data, "chunk {chunk} len {len}");
                assert!(report.is_clean());
                assert_eq!(report.chunks, codec.config().chunk_count(len as u64));
            }
        }
    }

    #[test]
    fn test_empty_stream() {
        let codec = ChunkedCodec::new(ChunkConfig::default());
        let encoded = codec.encode_bytes(&[]).unwrap();
        assert!(encoded.is_empty());
        let (decoded, report) = codec.decode_bytes(&encoded, 0, CorruptionPolicy::Fail).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(report.chunks, 0);
    }

    #[test]
    fn test_corruption_skip_zero_fills_chunk() {
        let codec = ChunkedCodec::new(ChunkConfig::new(8).unwrap());
        let data = sample(30);
        let mut encoded = codec.encode_bytes(&data).unwrap();
        // Second codeword starts at enc_bytes_per_chunk.
        let enc = codec.config().enc_bytes_per_chunk;
        encoded[enc + 1] ^= 0x04;

        let (decoded, report) = codec.decode_bytes(&encoded, 30, CorruptionPolicy::Skip).unwrap();
        assert_eq!(decoded.len(), 30);
        assert_eq!(report.corrupted_chunks, vec![1]);
        assert_eq!(&decoded[..8], &data[..8]);
        assert_eq!(&decoded[8..16], &[0u8; 8]);
        assert_eq!(&decoded[16..], &data[16..]);
    }

    #[test]
    fn test_corruption_fail_reports_chunk() {
        let codec = ChunkedCodec::new(ChunkConfig::new(8).unwrap());
        let data = sample(20);
        let mut encoded = codec.encode_bytes(&data).unwrap();
        let last = encoded.len() - 1;
        // Tail holds 4 bytes = 32 data bits + 6 parity = 38 bits; bit 37 is in range.
        encoded[last] ^= 0x20;

        let err = codec
            .decode_bytes(&encoded, 20, CorruptionPolicy::Fail)
            .unwrap_err();
        let enc = codec.config().enc_bytes_per_chunk as u64;
        assert!(matches!(
            err,
            HamArcError::Corrupted { chunk: 2, offset } if offset == 2 * enc
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let codec = ChunkedCodec::new(ChunkConfig::default());
        let encoded = codec.encode_bytes(b"hello").unwrap();
        let mut input = &encoded[..];
        let err = codec
            .decode_stream(&mut input, 6, encoded.len() as u64, &mut Vec::new(), CorruptionPolicy::Skip)
            .unwrap_err();
        assert!(matches!(err, HamArcError::SizeMismatch { .. }));
    }

    #[test]
    fn test_short_input_is_io_error() {
        let codec = ChunkedCodec::new(ChunkConfig::new(4).unwrap());
        let mut input: &[u8] = b"abc";
        let err = codec.encode_stream(&mut input, 10, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, HamArcError::Io(_)));
    }

    #[test]
    fn test_verify_stream() {
        let codec = ChunkedCodec::new(ChunkConfig::new(3).unwrap());
        let data = sample(10);
        let mut encoded = codec.encode_bytes(&data).unwrap();
        let clean = codec
            .verify_stream(&mut &encoded[..], 10, encoded.len() as u64)
            .unwrap();
        assert!(clean.is_clean());

        encoded[0] ^= 0x01;
        let dirty = codec
            .verify_stream(&mut &encoded[..], 10, encoded.len() as u64)
            .unwrap();
        assert_eq!(dirty.corrupted_chunks, vec![0]);
    }
}
