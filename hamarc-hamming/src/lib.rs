//! # HamArc Hamming
//!
//! Pure Rust Hamming error-detecting codec for HAM archives.
//!
//! This crate protects byte streams with per-chunk Hamming codewords.
//!
//! ## Features
//!
//! - **Codeword**: [`HammingCodec`] places parity bits at power-of-two
//!   positions and detects any single flipped bit
//! - **Geometry**: [`ChunkConfig`] derives encoded chunk sizes from a
//!   plaintext window size
//! - **Streams**: [`ChunkedCodec`] encodes any `Read` into any `Write`,
//!   with a shorter codeword for the final window
//!
//! ## Example
//!
//! ```rust
//! use hamarc_hamming::{ChunkConfig, ChunkedCodec, CorruptionPolicy};
//!
//! let codec = ChunkedCodec::new(ChunkConfig::new(16).unwrap());
//! let original = b"Hello, Hamming! Hello, Hamming!";
//!
//! let encoded = codec.encode_bytes(original).unwrap();
//! assert_eq!(encoded.len() as u64, codec.calc_encoded_size(original.len() as u64));
//!
//! let (decoded, report) = codec
//!     .decode_bytes(&encoded, original.len() as u64, CorruptionPolicy::Fail)
//!     .unwrap();
//! assert_eq!(&decoded, original);
//! assert!(report.is_clean());
//! ```
//!
//! ## Detection only
//!
//! A nonzero syndrome marks the codeword as damaged. The syndrome of a
//! single flipped bit equals its position, but correction is deliberately
//! not performed: damaged chunks are reported instead.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod hamming;
pub mod stream;

// Re-exports
pub use config::{ChunkConfig, DEFAULT_BYTES_PER_CHUNK, MAX_BYTES_PER_CHUNK};
pub use hamming::{HammingCodec, decode, encode, encoded_bits_for, parity_bits_for};
pub use stream::{ChunkedCodec, CorruptionPolicy, DecodeReport};
