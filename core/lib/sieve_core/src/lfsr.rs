//! Companion matrices for R1/R2/R3 and the R4 clock-control pattern table.
//!
//! Grounded on `original_source/source/lfsr_state.c` (companion matrix
//! construction) and `original_source/tools/gen_r4_patterns.c` (clock
//! pattern generation).

use gf2matrix::GF2Matrix;
use rayon::prelude::*;

use crate::error::{CoreError, CoreResult};

/// Feedback polynomial / register length pairs, spec section 6.
pub const R1_FEEDBACK: u32 = 0xE4000;
pub const R1_LEN: usize = 19;
pub const R2_FEEDBACK: u32 = 0x622000;
pub const R2_LEN: usize = 22;
pub const R3_FEEDBACK: u32 = 0xCC0000;
pub const R3_LEN: usize = 23;
pub const R4_FEEDBACK: u32 = 0x26200;
pub const R4_LEN: usize = 17;
const R4_MASK: u32 = (1u32 << R4_LEN) - 1;

pub const DISCARD_PREFIX: usize = 250;
pub const BLOCK_BITS: usize = 208;
pub const CLOCK_PATTERN_LEN: usize = DISCARD_PREFIX + BLOCK_BITS; // 458
pub const R4_SPACE: usize = 1 << 16;

/// Builds the plain (non-transposed) companion matrix for a feedback
/// polynomial of the given register length: row 0 holds the feedback taps
/// with a forced 1 in the last column, and a subdiagonal of 1s below it.
fn companion_matrix(feedback: u32, len: usize) -> GF2Matrix {
    let mut a = GF2Matrix::new(len, len);
    for j in 0..len {
        if j == len - 1 {
            a.set(0, j, true);
        } else {
            a.set(0, j, (feedback >> (j + 1)) & 1 == 1);
        }
    }
    for i in 1..len {
        a.set(i, i - 1, true);
    }
    a
}

/// Builds the *transposed* companion matrix used to clock a `1xn` row state
/// vector via `state <- state * A`.
pub fn companion_matrix_transposed(feedback: u32, len: usize) -> GF2Matrix {
    companion_matrix(feedback, len).transpose()
}

/// The three companion matrices used by the symbolic expansion, plus R4's
/// (kept for completeness and for the bit-level clock-table generator, even
/// though the symbolic engine never clocks R4 through matrix multiplication).
pub struct CompanionMatrices {
    pub a1: GF2Matrix,
    pub a2: GF2Matrix,
    pub a3: GF2Matrix,
    pub a4: GF2Matrix,
}

impl CompanionMatrices {
    pub fn build() -> Self {
        CompanionMatrices {
            a1: companion_matrix_transposed(R1_FEEDBACK, R1_LEN),
            a2: companion_matrix_transposed(R2_FEEDBACK, R2_LEN),
            a3: companion_matrix_transposed(R3_FEEDBACK, R3_LEN),
            a4: companion_matrix_transposed(R4_FEEDBACK, R4_LEN),
        }
    }

    /// Sanity-checks dimensions; cheap, run once at context construction.
    pub fn verify(&self) -> CoreResult<()> {
        let checks = [
            (&self.a1, R1_LEN, "A1 (R1)"),
            (&self.a2, R2_LEN, "A2 (R2)"),
            (&self.a3, R3_LEN, "A3 (R3)"),
            (&self.a4, R4_LEN, "A4 (R4)"),
        ];
        for (mat, expected, name) in checks.iter() {
            if mat.rows() != *expected || mat.cols() != *expected {
                return Err(CoreError::InternalInvariant(format!(
                    "{} has wrong size: got {}x{}, expected {}x{}",
                    name,
                    mat.rows(),
                    mat.cols(),
                    expected,
                    expected
                )));
            }
        }
        Ok(())
    }
}

fn parity32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x ^= x >> 8;
    x ^= x >> 4;
    x ^= x >> 2;
    x ^= x >> 1;
    x & 1
}

fn maj(a: u32, b: u32, c: u32) -> u32 {
    (a & b) | (b & c) | (c & a)
}

/// One clock-control pattern: a byte per discard-or-output step, low 3 bits
/// valid (bit 2: R1 clocks, bit 1: R2 clocks, bit 0: R3 clocks).
pub type ClockPattern = [u8; CLOCK_PATTERN_LEN];

/// Generates the clock pattern for the R4 state whose upper 16 bits are
/// `r4_index` (LSB forced to 1, per spec section 4.B).
pub fn generate_pattern(r4_index: u16) -> ClockPattern {
    let mut reg: u32 = ((r4_index as u32) << 1) | 1;
    let mut pattern = [0u8; CLOCK_PATTERN_LEN];
    for slot in pattern.iter_mut() {
        let b1 = (reg >> 1) & 1;
        let b6 = (reg >> 6) & 1;
        let b15 = (reg >> 15) & 1;
        let m = maj(b1, b6, b15);

        let mut p = 0u8;
        if m == b15 {
            p |= 0b100;
        }
        if m == b6 {
            p |= 0b010;
        }
        if m == b1 {
            p |= 0b001;
        }
        *slot = p;

        reg <<= 1;
        let t = parity32(reg & R4_FEEDBACK);
        reg = (reg & R4_MASK) ^ t;
    }
    pattern
}

/// The full `2^16 x 458` clock-pattern table.
///
/// Held as a flat `Vec<u8>` rather than `Vec<ClockPattern>` so the ~30 MiB
/// table is one contiguous allocation; `pattern(r4_index)` slices into it.
pub struct ClockTable {
    data: Vec<u8>,
}

impl ClockTable {
    /// Builds the full table by direct generation (spec's `r4_clock_patterns.bin`
    /// content, computed rather than loaded — `sieve_io` also knows how to load
    /// a pre-generated file and should produce bit-identical results).
    pub fn build() -> Self {
        let mut data = vec![0u8; R4_SPACE * CLOCK_PATTERN_LEN];
        data.par_chunks_mut(CLOCK_PATTERN_LEN)
            .enumerate()
            .for_each(|(idx, chunk)| {
                chunk.copy_from_slice(&generate_pattern(idx as u16));
            });
        ClockTable { data }
    }

    /// Wraps an already-loaded flat buffer (e.g. from `sieve_io`'s loader),
    /// validating its length.
    pub fn from_raw(data: Vec<u8>) -> CoreResult<Self> {
        let expected = R4_SPACE * CLOCK_PATTERN_LEN;
        if data.len() != expected {
            return Err(CoreError::InvalidInput(format!(
                "clock pattern table: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        Ok(ClockTable { data })
    }

    pub fn pattern(&self, r4_index: u16) -> &ClockPattern {
        let start = r4_index as usize * CLOCK_PATTERN_LEN;
        let slice = &self.data[start..start + CLOCK_PATTERN_LEN];
        slice.try_into().expect("slice has exactly CLOCK_PATTERN_LEN bytes")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_matrix_dimensions() {
        let mats = CompanionMatrices::build();
        mats.verify().unwrap();
    }

    #[test]
    fn pattern_low_bits_only() {
        for r4 in [0u16, 1, 12345, 65535] {
            let pattern = generate_pattern(r4);
            for &byte in pattern.iter() {
                assert_eq!(byte & !0b111, 0, "r4={} has stray high bits", r4);
            }
        }
    }

    #[test]
    fn pattern_endpoints_are_well_formed() {
        let lo = generate_pattern(0);
        let hi = generate_pattern(u16::MAX);
        assert_eq!(lo.len(), CLOCK_PATTERN_LEN);
        assert_eq!(hi.len(), CLOCK_PATTERN_LEN);
    }

    #[test]
    fn table_matches_direct_generation() {
        let table = ClockTable::build();
        for r4 in [0u16, 1, 512, 65535] {
            assert_eq!(table.pattern(r4), &generate_pattern(r4));
        }
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(ClockTable::from_raw(vec![0u8; 10]).is_err());
    }
}
