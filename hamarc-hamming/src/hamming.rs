//! Single-codeword Hamming encoding and error detection.
//!
//! A message of `N` data bits is extended with `K` parity bits, where `K`
//! is the smallest value satisfying `2^K >= N + K + 1`. Using 1-based
//! positions inside the `N + K` bit codeword:
//!
//! - positions that are powers of two (1, 2, 4, ...) hold parity bits;
//! - all remaining positions hold the data bits, in order.
//!
//! Parity bit `k` is the XOR of every data position whose index has bit `k`
//! set. Encoding is two-phase: data bits are placed first with the parity
//! slots still zero, then all `K` parity values are computed from that
//! vector and written at once, so no parity value ever depends on another.
//!
//! Decoding recomputes the same `K` products over the received codeword.
//! A nonzero syndrome means the codeword was damaged. No correction is
//! attempted.
//!
//! # Example
//!
//! ```
//! use hamarc_core::BitVector;
//! use hamarc_hamming::HammingCodec;
//!
//! let data = BitVector::from_bytes(b"hi".to_vec(), 16);
//! let codec = HammingCodec::new(16);
//! assert_eq!(codec.code_bits(), 21);
//!
//! let mut code = codec.encode(&data);
//! assert_eq!(codec.decode(&code), Some(data));
//!
//! code.set(6, !code.get(6));
//! assert_eq!(codec.decode(&code), None);
//! ```

use hamarc_core::{BitMatrix, BitVector};

/// Number of parity bits needed to protect `data_bits` bits.
///
/// Smallest `K >= 1` with `2^K >= data_bits + K + 1`.
pub fn parity_bits_for(data_bits: usize) -> usize {
    let mut k = 1usize;
    while (1u128 << k) < (data_bits + k + 1) as u128 {
        k += 1;
    }
    k
}

/// Length of the codeword produced for `data_bits` bits of data.
pub fn encoded_bits_for(data_bits: usize) -> usize {
    data_bits + parity_bits_for(data_bits)
}

/// Number of parity bits inside a received codeword of `code_bits` bits.
///
/// Equal to `ceil(log2(code_bits + 1))`.
pub fn parity_bits_in(code_bits: usize) -> usize {
    let mut k = 0usize;
    while (1u128 << k) < (code_bits + 1) as u128 {
        k += 1;
    }
    k
}

/// Hamming codec for one fixed codeword geometry.
///
/// The parity-check matrix is built once and reused for every codeword, so
/// a stream encoder keeps one codec per chunk size.
#[derive(Debug, Clone)]
pub struct HammingCodec {
    data_bits: usize,
    parity_bits: usize,
    matrix: BitMatrix,
}

impl HammingCodec {
    /// Create a codec for messages of exactly `data_bits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `data_bits` is zero.
    pub fn new(data_bits: usize) -> Self {
        assert!(data_bits > 0, "Hamming codeword needs at least one data bit");
        let parity_bits = parity_bits_for(data_bits);
        Self {
            data_bits,
            parity_bits,
            matrix: BitMatrix::parity_check(parity_bits, data_bits + parity_bits),
        }
    }

    /// Create a codec that reads codewords of `code_bits` bits.
    ///
    /// The parity count is derived from the codeword length alone, so this
    /// also accepts lengths the encoder would never produce.
    pub fn from_code_bits(code_bits: usize) -> Self {
        let parity_bits = parity_bits_in(code_bits);
        Self {
            data_bits: code_bits.saturating_sub(parity_bits),
            parity_bits,
            matrix: BitMatrix::parity_check(parity_bits, code_bits),
        }
    }

    /// Data bits per codeword.
    pub fn data_bits(&self) -> usize {
        self.data_bits
    }

    /// Parity bits per codeword.
    pub fn parity_bits(&self) -> usize {
        self.parity_bits
    }

    /// Total codeword length in bits.
    pub fn code_bits(&self) -> usize {
        self.matrix.cols()
    }

    /// Codeword length rounded up to whole bytes.
    pub fn code_bytes(&self) -> usize {
        self.code_bits().div_ceil(8)
    }

    /// Encode `data` into a codeword.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` differs from [`data_bits`](Self::data_bits).
    pub fn encode(&self, data: &BitVector) -> BitVector {
        assert_eq!(data.len(), self.data_bits, "data length mismatch");

        // Phase 1: data bits into non-power-of-two positions.
        let mut code = BitVector::new(self.code_bits());
        let mut src = 0;
        for i in 0..self.code_bits() {
            if !(i + 1).is_power_of_two() {
                code.set(i, data.get(src));
                src += 1;
            }
        }

        // Phase 2: parity slots are still zero, so the product covers data only.
        let parity = self.matrix.mul_vec(&code);
        for k in 0..self.parity_bits {
            code.set((1usize << k) - 1, (parity >> k) & 1 == 1);
        }
        code
    }

    /// Recompute the parity products over a received codeword.
    ///
    /// Zero means the codeword is consistent. For a single flipped bit the
    /// value equals the 1-based position of that bit.
    pub fn syndrome(&self, code: &BitVector) -> u64 {
        self.matrix.mul_vec(code)
    }

    /// Check a codeword and extract its data bits.
    ///
    /// Returns `None` when the syndrome is nonzero.
    pub fn decode(&self, code: &BitVector) -> Option<BitVector> {
        if self.syndrome(code) != 0 {
            return None;
        }

        let mut data = BitVector::new(self.data_bits);
        let mut dst = 0;
        for i in 0..self.code_bits().min(code.len()) {
            if !(i + 1).is_power_of_two() {
                data.set(dst, code.get(i));
                dst += 1;
            }
        }
        Some(data)
    }
}

/// Encode a bit vector of any nonzero length.
pub fn encode(data: &BitVector) -> BitVector {
    HammingCodec::new(data.len()).encode(data)
}

/// Decode a codeword of any length, deriving the parity count from it.
///
/// Returns `(true, data)` when the codeword is consistent and
/// `(false, empty)` otherwise.
pub fn decode(code: &BitVector) -> (bool, BitVector) {
    match HammingCodec::from_code_bits(code.len()).decode(code) {
        Some(data) => (true, data),
        None => (false, BitVector::default()),
    }
}
