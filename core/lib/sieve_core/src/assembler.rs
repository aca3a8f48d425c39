//! Per-block system assembler: turns `CtHt[r4]`, the `V[1..14]` propagators,
//! and the 15 descrambled ciphertext vectors into `(A_i, b_i)` pairs ready
//! for the solver (spec section 4.F).

use gf2matrix::GF2Matrix;

use crate::error::{CoreError, CoreResult};
use crate::symbolic::TOTAL_VARS;

pub const NUM_BLOCKS: usize = 15;
pub const H_ROWS: usize = 48;

/// One block's linear system: `A_i` is `48 x 655` (coefficients over the
/// non-constant monomials), `b_i` is `48 x 1`.
pub struct BlockSystem {
    pub a: GF2Matrix,
    pub b: GF2Matrix,
}

/// `c_i . H^T`, a `1 x 48` row, for block `i`. Callers derive these from the
/// descrambled ciphertext (`sieve_io`'s concern); this module only consumes
/// them.
pub type CipherSyndromeRow = GF2Matrix;

/// Builds the 15 `(A_i, b_i)` pairs for one `r4`.
///
/// `cipher_ht` must hold exactly [`NUM_BLOCKS`] rows, each `1 x 48`; `v_diff`
/// must hold exactly 14 `656 x 656` matrices (`V[1]..V[14]`, indexed `0..13`).
pub fn build_block_systems(
    ctht: &GF2Matrix,
    v_diff: &[GF2Matrix],
    cipher_ht: &[CipherSyndromeRow],
) -> CoreResult<Vec<BlockSystem>> {
    if ctht.rows() != TOTAL_VARS || ctht.cols() != H_ROWS {
        return Err(CoreError::InvalidInput(format!(
            "CtHt[r4]: expected {}x{}, got {}x{}",
            TOTAL_VARS,
            H_ROWS,
            ctht.rows(),
            ctht.cols()
        )));
    }
    if v_diff.len() != NUM_BLOCKS - 1 {
        return Err(CoreError::InvalidInput(format!(
            "v_diff: expected {} matrices, got {}",
            NUM_BLOCKS - 1,
            v_diff.len()
        )));
    }
    if cipher_ht.len() != NUM_BLOCKS {
        return Err(CoreError::InvalidInput(format!(
            "cipher_ht: expected {} rows, got {}",
            NUM_BLOCKS,
            cipher_ht.len()
        )));
    }

    let mut systems = Vec::with_capacity(NUM_BLOCKS);
    for i in 0..NUM_BLOCKS {
        let s = if i == 0 {
            ctht.clone()
        } else {
            v_diff[i - 1].mul(ctht)?
        };

        let c_ht_row = &cipher_ht[i];
        if c_ht_row.rows() != 1 || c_ht_row.cols() != H_ROWS {
            return Err(CoreError::InvalidInput(format!(
                "cipher_ht[{}]: expected 1x{}, got {}x{}",
                i,
                H_ROWS,
                c_ht_row.rows(),
                c_ht_row.cols()
            )));
        }

        let r0 = s.window(0, 0, 1, H_ROWS)?;
        let mut b_row = r0;
        b_row.add_assign(c_ht_row)?;
        let b = b_row.transpose();

        let a_part = s.window(1, 0, TOTAL_VARS, H_ROWS)?;
        let a = a_part.transpose();

        systems.push(BlockSystem { a, b });
    }

    Ok(systems)
}
