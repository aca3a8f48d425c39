//! Loaders for the six on-disk artifacts of spec section 6, each a flat,
//! MSB-first, row-major packed-bit binary. Grounded on
//! `original_source/source/lfsr_state.c`'s `lfsr_matrices_init` (the `zS.bin`
//! byte-per-bit layout) and `original_source/include/decrypt.h`'s
//! `load_packed_bin`/`load_packed_matrix` declarations.

use std::path::Path;

use gf2matrix::GF2Matrix;
use sieve_core::assembler::{CipherSyndromeRow, H_ROWS, NUM_BLOCKS};
use sieve_core::context::GT_COLS;
use sieve_core::lfsr::{BLOCK_BITS, CLOCK_PATTERN_LEN, R4_SPACE};
use sieve_core::symbolic::Register;
use sieve_core::vdiff::ZsRow;

use crate::error::{IoError, IoResult};

fn read_file(path: &Path) -> IoResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn expect_len(path: &Path, bytes: &[u8], expected: usize) -> IoResult<()> {
    if bytes.len() != expected {
        return Err(IoError::WrongLength {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Loads `H.bin` (`48 x 208`, 1248 bytes).
pub fn load_h(path: &Path) -> IoResult<GF2Matrix> {
    let bytes = read_file(path)?;
    expect_len(path, &bytes, H_ROWS * BLOCK_BITS / 8)?;
    Ok(GF2Matrix::from_packed_bits(&bytes, H_ROWS, BLOCK_BITS)?)
}

/// Loads `Gt.bin` (`208 x 160`, 4160 bytes).
pub fn load_gt(path: &Path) -> IoResult<GF2Matrix> {
    let bytes = read_file(path)?;
    expect_len(path, &bytes, BLOCK_BITS * GT_COLS / 8)?;
    Ok(GF2Matrix::from_packed_bits(&bytes, BLOCK_BITS, GT_COLS)?)
}

/// Loads `r4_clock_patterns.bin` (`2^16 x 458` bytes, one byte per step, low
/// 3 bits valid).
pub fn load_clock_patterns(path: &Path) -> IoResult<sieve_core::lfsr::ClockTable> {
    let bytes = read_file(path)?;
    expect_len(path, &bytes, R4_SPACE * CLOCK_PATTERN_LEN)?;
    Ok(sieve_core::lfsr::ClockTable::from_raw(bytes)?)
}

/// Loads `zS.bin`: 14 rows, each row a flat run of `18+21+22+16 = 77` raw
/// bits (one byte per bit, non-zero meaning 1), no padding between rows.
pub fn load_zs(path: &Path) -> IoResult<Vec<ZsRow>> {
    const ROW_BITS: usize = 77;
    let bytes = read_file(path)?;
    expect_len(path, &bytes, sieve_core::vdiff::ZS_ROWS * ROW_BITS)?;

    let mut rows = Vec::with_capacity(sieve_core::vdiff::ZS_ROWS);
    for r in 0..sieve_core::vdiff::ZS_ROWS {
        let row = &bytes[r * ROW_BITS..(r + 1) * ROW_BITS];
        let mut cursor = 0usize;
        let take = |cursor: &mut usize, n: usize| -> Vec<bool> {
            let slice: Vec<bool> = row[*cursor..*cursor + n].iter().map(|&b| b != 0).collect();
            *cursor += n;
            slice
        };
        let r1 = take(&mut cursor, Register::R1.len() - 1);
        let r2 = take(&mut cursor, Register::R2.len() - 1);
        let r3 = take(&mut cursor, Register::R3.len() - 1);
        let r4 = take(&mut cursor, 16);
        rows.push(ZsRow { r1, r2, r3, r4 });
    }
    Ok(rows)
}

/// Loads the 15 ciphertext blocks (`ciphertext.bin`, `15 * 26` bytes), each
/// packed into a `1 x 208` row.
pub fn load_ciphertext(path: &Path) -> IoResult<Vec<GF2Matrix>> {
    const BLOCK_BYTES: usize = BLOCK_BITS / 8;
    let bytes = read_file(path)?;
    expect_len(path, &bytes, NUM_BLOCKS * BLOCK_BYTES)?;
    (0..NUM_BLOCKS)
        .map(|i| {
            let block = &bytes[i * BLOCK_BYTES..(i + 1) * BLOCK_BYTES];
            Ok(GF2Matrix::from_packed_bits(block, 1, BLOCK_BITS)?)
        })
        .collect()
}

/// Loads the descrambling constant `s.bin` (26 bytes) as a `1 x 208` row.
pub fn load_s(path: &Path) -> IoResult<GF2Matrix> {
    const BLOCK_BYTES: usize = BLOCK_BITS / 8;
    let bytes = read_file(path)?;
    expect_len(path, &bytes, BLOCK_BYTES)?;
    Ok(GF2Matrix::from_packed_bits(&bytes, 1, BLOCK_BITS)?)
}

/// Descrambles the 15 raw ciphertext blocks (`c_i ^= s`) and projects each
/// through `H^T`, producing the `cHt_i` rows the assembler consumes (spec
/// section 4.F: "already with the scrambling constant s removed").
pub fn descramble_and_project(
    ciphertext: &[GF2Matrix],
    s: &GF2Matrix,
    ht: &GF2Matrix,
) -> IoResult<Vec<CipherSyndromeRow>> {
    if ciphertext.len() != NUM_BLOCKS {
        return Err(IoError::Core(sieve_core::CoreError::InvalidInput(format!(
            "ciphertext: expected {} blocks, got {}",
            NUM_BLOCKS,
            ciphertext.len()
        ))));
    }
    ciphertext
        .iter()
        .map(|c| {
            let mut descrambled = c.clone();
            descrambled.add_assign(s)?;
            Ok(descrambled.mul(ht)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_round_trips_through_packed_bits() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        use rand::SeedableRng;
        let h = GF2Matrix::random(H_ROWS, BLOCK_BITS, &mut rng);
        let packed = h.to_packed_bits();
        let dir = std::env::temp_dir().join(format!("sieve_io_h_test_{}", std::process::id()));
        std::fs::write(&dir, &packed).unwrap();
        let loaded = load_h(&dir).unwrap();
        std::fs::remove_file(&dir).ok();
        assert_eq!(h, loaded);
    }

    #[test]
    fn wrong_length_h_is_rejected() {
        let dir = std::env::temp_dir().join(format!("sieve_io_h_bad_{}", std::process::id()));
        std::fs::write(&dir, vec![0u8; 3]).unwrap();
        let result = load_h(&dir);
        std::fs::remove_file(&dir).ok();
        assert!(result.is_err());
    }

    #[test]
    fn descramble_and_project_removes_s_before_projecting() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        use rand::SeedableRng;
        let h = GF2Matrix::random(H_ROWS, BLOCK_BITS, &mut rng);
        let ht = h.transpose();
        let s = GF2Matrix::random(1, BLOCK_BITS, &mut rng);
        let mut scrambled = GF2Matrix::random(1, BLOCK_BITS, &mut rng);
        let plain = scrambled.clone();
        scrambled.add_assign(&s).unwrap();

        let blocks: Vec<GF2Matrix> = (0..NUM_BLOCKS).map(|_| scrambled.clone()).collect();
        let projected = descramble_and_project(&blocks, &s, &ht).unwrap();
        let expected = plain.mul(&ht).unwrap();
        for row in &projected {
            assert_eq!(row, &expected);
        }
    }
}
