//! Dense, word-packed matrices over GF(2).
//!
//! Rows are stored contiguously as `u64` words, MSB-first within a byte when
//! serialized (see [`GF2Matrix::from_packed_bits`] / [`GF2Matrix::to_packed_bits`]),
//! but bit-addressed in the natural way for in-memory arithmetic. This crate
//! has no file I/O of its own; artifact loading lives in `sieve_io`.

use std::fmt;

use rand::Rng;
use thiserror::Error;

const WORD_BITS: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GF2Error {
    #[error("dimension mismatch: {op} expected {expected}, got {actual}")]
    DimensionMismatch {
        op: &'static str,
        expected: String,
        actual: String,
    },
    #[error("index ({row}, {col}) out of bounds for a {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("window ({top},{left})..({bottom},{right}) out of bounds for a {rows}x{cols} matrix")]
    BadWindow {
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
        rows: usize,
        cols: usize,
    },
}

/// A dense row-major GF(2) matrix, word-packed for fast XOR and dot-product.
#[derive(Clone, PartialEq, Eq)]
pub struct GF2Matrix {
    rows: usize,
    cols: usize,
    words_per_row: usize,
    data: Vec<u64>,
}

impl fmt::Debug for GF2Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GF2Matrix({}x{})", self.rows, self.cols)
    }
}

impl GF2Matrix {
    /// Allocates a zeroed `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        let words_per_row = (cols + WORD_BITS - 1) / WORD_BITS;
        GF2Matrix {
            rows,
            cols,
            words_per_row,
            data: vec![0u64; rows * words_per_row],
        }
    }

    /// Allocates a matrix with independently random bits.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut m = Self::new(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                if rng.gen::<bool>() {
                    m.set(r, c, true);
                }
            }
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn word_index(&self, row: usize, col: usize) -> (usize, usize) {
        (row * self.words_per_row + col / WORD_BITS, col % WORD_BITS)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        let (word, bit) = self.word_index(row, col);
        (self.data[word] >> bit) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        debug_assert!(row < self.rows && col < self.cols);
        let (word, bit) = self.word_index(row, col);
        if value {
            self.data[word] |= 1u64 << bit;
        } else {
            self.data[word] &= !(1u64 << bit);
        }
    }

    /// Flips a bit (XORs in a 1); equivalent to `set(r, c, get(r, c) ^ true)`.
    #[inline]
    pub fn xor_bit(&mut self, row: usize, col: usize, value: bool) {
        if value {
            let (word, bit) = self.word_index(row, col);
            self.data[word] ^= 1u64 << bit;
        }
    }

    /// Clears an entire row back to zero.
    pub fn clear_row(&mut self, row: usize) {
        let start = row * self.words_per_row;
        for w in &mut self.data[start..start + self.words_per_row] {
            *w = 0;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// `self += other` (GF(2) addition is XOR). Dimensions must match.
    pub fn add_assign(&mut self, other: &GF2Matrix) -> Result<(), GF2Error> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(GF2Error::DimensionMismatch {
                op: "add_assign",
                expected: format!("{}x{}", self.rows, self.cols),
                actual: format!("{}x{}", other.rows, other.cols),
            });
        }
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a ^= b;
        }
        Ok(())
    }

    /// Standard GF(2) matrix multiply `self x other`, producing a fresh matrix.
    pub fn mul(&self, other: &GF2Matrix) -> Result<GF2Matrix, GF2Error> {
        if self.cols != other.rows {
            return Err(GF2Error::DimensionMismatch {
                op: "mul",
                expected: format!("{}x*", self.cols),
                actual: format!("{}x{}", other.rows, other.cols),
            });
        }
        let mut out = GF2Matrix::new(self.rows, other.cols);
        // `other` is walked column-major via its transpose so each inner
        // product is a word-wise AND-popcount-parity over a full row.
        let other_t = other.transpose();
        for i in 0..self.rows {
            let self_row = &self.data[i * self.words_per_row..(i + 1) * self.words_per_row];
            for j in 0..other.cols {
                let other_col =
                    &other_t.data[j * other_t.words_per_row..(j + 1) * other_t.words_per_row];
                let mut acc = 0u64;
                for (a, b) in self_row.iter().zip(other_col.iter()) {
                    acc ^= a & b;
                }
                if acc.count_ones() & 1 == 1 {
                    out.set(i, j, true);
                }
            }
        }
        Ok(out)
    }

    /// Transpose, returning a fresh matrix.
    pub fn transpose(&self) -> GF2Matrix {
        let mut out = GF2Matrix::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.get(r, c) {
                    out.set(c, r, true);
                }
            }
        }
        out
    }

    /// In-place Gauss-Jordan elimination to reduced row-echelon form. Returns the rank.
    pub fn echelonize(&mut self) -> usize {
        self.echelonize_with_pivots().0
    }

    /// Same as [`Self::echelonize`], additionally returning the pivot column
    /// for each of the first `rank` rows (row `i`'s pivot lives at column
    /// `pivots[i]`), needed by solvability checks that sweep a candidate
    /// row against specific pivot columns rather than re-deriving them.
    pub fn echelonize_with_pivots(&mut self) -> (usize, Vec<usize>) {
        let mut pivot_row = 0;
        let mut pivots = Vec::new();
        for col in 0..self.cols {
            if pivot_row >= self.rows {
                break;
            }
            let mut sel = None;
            for r in pivot_row..self.rows {
                if self.get(r, col) {
                    sel = Some(r);
                    break;
                }
            }
            let sel = match sel {
                Some(r) => r,
                None => continue,
            };
            if sel != pivot_row {
                self.swap_rows(sel, pivot_row);
            }
            for r in 0..self.rows {
                if r != pivot_row && self.get(r, col) {
                    self.xor_row_into(pivot_row, r);
                }
            }
            pivots.push(col);
            pivot_row += 1;
        }
        (pivot_row, pivots)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let wpr = self.words_per_row;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.data.split_at_mut(hi * wpr);
        left[lo * wpr..(lo + 1) * wpr].swap_with_slice(&mut right[0..wpr]);
    }

    /// `dst_row ^= src_row`.
    fn xor_row_into(&mut self, src_row: usize, dst_row: usize) {
        let wpr = self.words_per_row;
        if src_row == dst_row {
            return;
        }
        let (lo, hi, src_is_lo) = if src_row < dst_row {
            (src_row, dst_row, true)
        } else {
            (dst_row, src_row, false)
        };
        let (left, right) = self.data.split_at_mut(hi * wpr);
        let (src, dst): (&[u64], &mut [u64]) = if src_is_lo {
            (&left[lo * wpr..(lo + 1) * wpr], &mut right[0..wpr])
        } else {
            (&right[0..wpr], &mut left[lo * wpr..(lo + 1) * wpr])
        };
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            *d ^= s;
        }
    }

    /// Returns a freshly-copied sub-matrix `[top, bottom) x [left, right)`.
    ///
    /// This is a copying "window", not a view: the spec's zero-copy window is
    /// naturally expressed in a GC'd/aliasing-friendly host language, but Rust's
    /// ownership model makes an aliased mutable sub-matrix either `unsafe` or a
    /// second borrowed type with no real benefit here, since every caller in
    /// this crate immediately consumes the window as an independent matrix
    /// (see `assembler::per_block_system`, which transposes the window right
    /// after extracting it). Mutating the returned copy never affects `self`.
    pub fn window(
        &self,
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
    ) -> Result<GF2Matrix, GF2Error> {
        if bottom > self.rows || right > self.cols || top > bottom || left > right {
            return Err(GF2Error::BadWindow {
                top,
                left,
                bottom,
                right,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let mut out = GF2Matrix::new(bottom - top, right - left);
        for r in top..bottom {
            for c in left..right {
                if self.get(r, c) {
                    out.set(r - top, c - left, true);
                }
            }
        }
        Ok(out)
    }

    /// Vertically stacks `self` on top of `other` (same column count required).
    pub fn stack(&self, other: &GF2Matrix) -> Result<GF2Matrix, GF2Error> {
        if self.cols != other.cols {
            return Err(GF2Error::DimensionMismatch {
                op: "stack",
                expected: format!("*x{}", self.cols),
                actual: format!("*x{}", other.cols),
            });
        }
        let mut out = GF2Matrix::new(self.rows + other.rows, self.cols);
        out.data[..self.data.len()].copy_from_slice(&self.data);
        out.data[self.data.len()..].copy_from_slice(&other.data);
        Ok(out)
    }

    /// Returns the column index of the first set bit at or after `start` in `row`, if any.
    pub fn first_set_from(&self, row: usize, start: usize) -> Option<usize> {
        (start..self.cols).find(|&c| self.get(row, c))
    }

    /// Reads a matrix from a flat, MSB-first, row-major packed bit buffer
    /// (the on-disk layout of every artifact in spec.md section 6).
    pub fn from_packed_bits(bytes: &[u8], rows: usize, cols: usize) -> Result<Self, GF2Error> {
        let expected_bytes = rows * ((cols + 7) / 8);
        if bytes.len() != expected_bytes {
            return Err(GF2Error::DimensionMismatch {
                op: "from_packed_bits",
                expected: format!("{} bytes", expected_bytes),
                actual: format!("{} bytes", bytes.len()),
            });
        }
        let row_bytes = (cols + 7) / 8;
        let mut out = GF2Matrix::new(rows, cols);
        for r in 0..rows {
            let row_slice = &bytes[r * row_bytes..(r + 1) * row_bytes];
            for c in 0..cols {
                let byte = row_slice[c / 8];
                let bit = 7 - (c % 8);
                if (byte >> bit) & 1 == 1 {
                    out.set(r, c, true);
                }
            }
        }
        Ok(out)
    }

    /// Serializes to the same MSB-first, row-major packed layout.
    pub fn to_packed_bits(&self) -> Vec<u8> {
        let row_bytes = (self.cols + 7) / 8;
        let mut out = vec![0u8; self.rows * row_bytes];
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.get(r, c) {
                    out[r * row_bytes + c / 8] |= 1 << (7 - (c % 8));
                }
            }
        }
        out
    }
}
