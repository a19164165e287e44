//! # HamArc Core
//!
//! Core components for the HamArc archive library.
//!
//! This crate provides the fundamental building blocks for HAM archives:
//!
//! - [`bitvec`]: Packed bit vectors and the parity-check matrix
//! - [`shift`]: Bounded-memory, in-place relocation of file byte ranges
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! HamArc is layered the same way as a classic archiver stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Front end                                           │
//! │     `hamarc` CLI                                        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     HAM header, entry table, gap-free payload region    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Hamming codeword + chunked stream adaptation        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Bits and bytes (this crate)                         │
//! │     BitVector/BitMatrix, range shift, errors            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hamarc_core::bitvec::BitVector;
//! use hamarc_core::shift::shift_range;
//! use std::io::Cursor;
//!
//! let mut bits = BitVector::new(8);
//! bits.set(7, true);
//! assert_eq!(bits.as_bytes(), &[0x80]);
//!
//! // Move bytes 2..6 three bytes to the right.
//! let mut cur = Cursor::new(vec![0u8, 1, 2, 3, 4, 5]);
//! shift_range(&mut cur, 2, 6, 3).unwrap();
//! assert_eq!(&cur.get_ref()[5..9], &[2, 3, 4, 5]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitvec;
pub mod error;
pub mod shift;

// Re-exports for convenience
pub use bitvec::{BitMatrix, BitVector, MAX_MATRIX_ROWS};
pub use error::{HamArcError, Result};
pub use shift::{SHIFT_BUFFER_SIZE, shift_range, shift_range_with_buffer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitvec::{BitMatrix, BitVector};
    pub use crate::error::{HamArcError, Result};
    pub use crate::shift::shift_range;
}
