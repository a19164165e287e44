//! Packed bit storage for codec arithmetic.
//!
//! [`BitVector`] stores bits LSB-first inside bytes: bit `i` lives in byte
//! `i / 8` at bit position `i % 8`. This is the same ordering the archive
//! uses on disk, so a vector's backing bytes can be written out directly.
//!
//! [`BitMatrix`] is a small row-major matrix of bit vectors used as scratch
//! space while computing Hamming parity products.
//!
//! # Example
//!
//! ```
//! use hamarc_core::bitvec::BitVector;
//!
//! let mut v = BitVector::new(12);
//! v.set(0, true);
//! v.set(9, true);
//! assert_eq!(v.byte_len(), 2);
//! assert_eq!(v.as_bytes(), &[0b0000_0001, 0b0000_0010]);
//! assert_eq!(v.to_bit_string(), "100000000100");
//! ```

use crate::error::{HamArcError, Result};
use std::fmt;

/// A fixed-length, zero-initialised vector of bits packed into bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BitVector {
    /// Backing bytes (LSB-first).
    bytes: Vec<u8>,
    /// Number of addressable bits.
    bit_count: usize,
}

impl BitVector {
    /// Create a zero-filled vector holding `bit_count` bits.
    pub fn new(bit_count: usize) -> Self {
        Self {
            bytes: vec![0u8; bit_count.div_ceil(8)],
            bit_count,
        }
    }

    /// Wrap existing bytes as a vector of `bit_count` bits.
    ///
    /// The byte buffer is resized to exactly `ceil(bit_count / 8)` bytes,
    /// truncating or zero-extending as needed. Bits past `bit_count` in the
    /// final byte are cleared.
    pub fn from_bytes(mut bytes: Vec<u8>, bit_count: usize) -> Self {
        bytes.resize(bit_count.div_ceil(8), 0);
        let used = bit_count % 8;
        if used != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
        Self { bytes, bit_count }
    }

    /// Build a vector from a slice of booleans.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut v = Self::new(bits.len());
        for (i, &bit) in bits.iter().enumerate() {
            v.set(i, bit);
        }
        v
    }

    /// Number of bits in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.bit_count
    }

    /// True if the vector holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// Size of the backing buffer in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Borrow the packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutably borrow the packed bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Consume the vector and return its packed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Read bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index / 8` is outside the backing buffer.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        (self.bytes[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Write bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index / 8` is outside the backing buffer.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        let mask = 1u8 << (index % 8);
        let byte = &mut self.bytes[index / 8];
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Checked variant of [`get`](Self::get).
    pub fn try_get(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.get(index))
    }

    /// Checked variant of [`set`](Self::set).
    pub fn try_set(&mut self, index: usize, value: bool) -> Result<()> {
        self.check_index(index)?;
        self.set(index, value);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index / 8 >= self.bytes.len() {
            return Err(HamArcError::BitIndexOutOfRange {
                index,
                bit_count: self.bit_count,
            });
        }
        Ok(())
    }

    /// Iterate over the addressable bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_count).map(move |i| self.get(i))
    }

    /// Render the bits as a string of `0`/`1`, bit 0 first.
    pub fn to_bit_string(&self) -> String {
        self.iter().map(|b| if b { '1' } else { '0' }).collect()
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({}: {})", self.bit_count, self.to_bit_string())
    }
}

/// Most rows a [`BitMatrix`] product can report, one per bit of a `u64`.
pub const MAX_MATRIX_ROWS: usize = 64;

/// A `rows x cols` matrix of bits stored as one [`BitVector`] per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: Vec<BitVector>,
    cols: usize,
}

impl BitMatrix {
    /// Create a zero matrix.
    ///
    /// # Panics
    ///
    /// Panics if `rows` exceeds [`MAX_MATRIX_ROWS`].
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(
            rows <= MAX_MATRIX_ROWS,
            "bit matrix limited to {MAX_MATRIX_ROWS} rows, got {rows}"
        );
        Self {
            rows: (0..rows).map(|_| BitVector::new(cols)).collect(),
            cols,
        }
    }

    /// Build the Hamming parity-check matrix with `k` rows and `n` columns.
    ///
    /// Row `r` has a one in column `j` iff bit `r` of `j + 1` is set, i.e.
    /// column `j` is the binary representation of its 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if `k` exceeds [`MAX_MATRIX_ROWS`].
    pub fn parity_check(k: usize, n: usize) -> Self {
        let mut mat = Self::new(k, n);
        for j in 0..n {
            let position = j + 1;
            for (r, row) in mat.rows.iter_mut().enumerate() {
                if r < usize::BITS as usize && (position >> r) & 1 == 1 {
                    row.set(j, true);
                }
            }
        }
        mat
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `r`.
    pub fn row(&self, r: usize) -> &BitVector {
        &self.rows[r]
    }

    /// Read the bit at (`r`, `c`).
    pub fn get(&self, r: usize, c: usize) -> bool {
        self.rows[r].get(c)
    }

    /// Write the bit at (`r`, `c`).
    pub fn set(&mut self, r: usize, c: usize, value: bool) {
        self.rows[r].set(c, value);
    }

    /// Multiply the matrix by `vec` over GF(2).
    ///
    /// Bit `r` of the result is the parity of `row(r) AND vec`. Only the
    /// first `min(cols, vec.len())` bits take part. Construction caps the
    /// row count at [`MAX_MATRIX_ROWS`], so every row has a result bit.
    pub fn mul_vec(&self, vec: &BitVector) -> u64 {
        let width = self.cols.min(vec.len());
        let full_bytes = width / 8;
        let tail_bits = width % 8;

        let mut result = 0u64;
        for (r, row) in self.rows.iter().enumerate() {
            let lhs = row.as_bytes();
            let rhs = vec.as_bytes();
            let mut ones: u32 = lhs[..full_bytes]
                .iter()
                .zip(&rhs[..full_bytes])
                .map(|(a, b)| (a & b).count_ones())
                .sum();
            if tail_bits > 0 {
                let mask = (1u8 << tail_bits) - 1;
                ones += (lhs[full_bytes] & rhs[full_bytes] & mask).count_ones();
            }
            if ones & 1 == 1 {
                result |= 1 << r;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let v = BitVector::new(13);
        assert_eq!(v.len(), 13);
        assert_eq!(v.byte_len(), 2);
        assert!(v.iter().all(|b| !b));
    }

    #[test]
    fn test_set_and_clear() {
        let mut v = BitVector::new(16);
        v.set(3, true);
        v.set(15, true);
        assert_eq!(v.as_bytes(), &[0b0000_1000, 0b1000_0000]);
        v.set(3, false);
        assert_eq!(v.as_bytes(), &[0, 0b1000_0000]);
        assert!(v.get(15));
        assert!(!v.get(3));
    }

    #[test]
    fn test_padding_bits_addressable() {
        // Bits in the final partial byte are still inside the buffer.
        let mut v = BitVector::new(10);
        assert!(v.try_set(15, true).is_ok());
        assert!(matches!(
            v.try_get(16),
            Err(HamArcError::BitIndexOutOfRange { index: 16, .. })
        ));
    }

    #[test]
    fn test_from_bytes_resizes() {
        let v = BitVector::from_bytes(vec![0xFF, 0xFF, 0xFF], 9);
        assert_eq!(v.as_bytes(), &[0xFF, 0x01]);
        let v = BitVector::from_bytes(vec![0x01], 20);
        assert_eq!(v.as_bytes(), &[0x01, 0, 0]);
    }

    #[test]
    fn test_bit_string() {
        let v = BitVector::from_bits(&[true, false, false, true, true]);
        assert_eq!(v.to_bit_string(), "10011");
    }

    #[test]
    fn test_parity_check_columns() {
        let m = BitMatrix::parity_check(3, 7);
        // Column j encodes j + 1 in binary, row 0 being the low bit.
        for j in 0..7 {
            let value = (0..3).fold(0, |acc, r| acc | ((m.get(r, j) as usize) << r));
            assert_eq!(value, j + 1);
        }
    }

    #[test]
    fn test_mul_vec() {
        let m = BitMatrix::parity_check(3, 7);
        // Single one at position 5 (index 4) yields syndrome 5.
        let mut v = BitVector::new(7);
        v.set(4, true);
        assert_eq!(m.mul_vec(&v), 5);
        // Positions 3 and 5 cancel on bit 0: 0b011 ^ 0b101 = 0b110.
        v.set(2, true);
        assert_eq!(m.mul_vec(&v), 6);
    }

    #[test]
    #[should_panic(expected = "limited to 64 rows")]
    fn test_row_limit_enforced() {
        let _ = BitMatrix::parity_check(65, 8);
    }

    #[test]
    fn test_mul_vec_ignores_padding() {
        let m = BitMatrix::parity_check(4, 12);
        let mut v = BitVector::new(12);
        v.set(14, true);
        assert_eq!(m.mul_vec(&v), 0);
    }
}
