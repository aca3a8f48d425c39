//! Inter-block propagator: the 14 `V[1..14]` matrices mapping block-0's
//! monomial vector to block-i's (spec section 4.E).
//!
//! Grounded on `include/decrypt.h`'s `zS` layout and the bilinear expansion
//! `(x+a)(y+b) = xy + by + ax + ab` used to re-derive quadratic monomials
//! after a constant shift on each linear term.

use gf2matrix::GF2Matrix;

use crate::error::{CoreError, CoreResult};
use crate::symbolic::{quad_index, Register, TOTAL_VARS};

pub const ZS_ROWS: usize = 14;

/// One row of the `zS` difference table: per-register bit differences
/// (excluding each register's LSB) between block 0 and block `i`, for
/// `i = row_index + 1`. The R4 component is carried for parity with the
/// on-disk row layout (18+21+22+16 bits) but is not consumed here: R4 is the
/// sieve variable, not one of the monomial-vector unknowns.
#[derive(Debug, Clone)]
pub struct ZsRow {
    pub r1: Vec<bool>,
    pub r2: Vec<bool>,
    pub r3: Vec<bool>,
    pub r4: Vec<bool>,
}

impl ZsRow {
    pub fn validate(&self) -> CoreResult<()> {
        let expected = [
            (self.r1.len(), Register::R1.len() - 1, "r1"),
            (self.r2.len(), Register::R2.len() - 1, "r2"),
            (self.r3.len(), Register::R3.len() - 1, "r3"),
            (self.r4.len(), 16, "r4"),
        ];
        for (got, want, name) in expected {
            if got != want {
                return Err(CoreError::InvalidInput(format!(
                    "zS row: {} has {} bits, expected {}",
                    name, got, want
                )));
            }
        }
        Ok(())
    }
}

fn identity(n: usize) -> GF2Matrix {
    let mut m = GF2Matrix::new(n, n);
    for i in 0..n {
        m.set(i, i, true);
    }
    m
}

fn apply_register_diff(v: &mut GF2Matrix, register: Register, d: &[bool]) {
    let n = register.len();
    debug_assert_eq!(d.len(), n - 1);
    let off = register.var_offset();
    let linear_index = |j: usize| off + (j - 1);

    for j in 1..n {
        if d[j - 1] {
            v.xor_bit(0, linear_index(j), true);
        }
    }

    for u in 1..n {
        for w in (u + 1)..n {
            let du = d[u - 1];
            let dw = d[w - 1];
            let k = off + (n - 1) + quad_index(n, u, w);
            if du && dw {
                v.xor_bit(0, k, true);
            }
            if dw {
                v.xor_bit(linear_index(u), k, true);
            }
            if du {
                v.xor_bit(linear_index(w), k, true);
            }
        }
    }
}

/// Builds `V[1..14]` from the 14 `zS` rows, `V[row_index]` corresponding to
/// block `row_index + 1`.
pub fn build_v_matrices(rows: &[ZsRow]) -> CoreResult<Vec<GF2Matrix>> {
    if rows.len() != ZS_ROWS {
        return Err(CoreError::InvalidInput(format!(
            "zS table: expected {} rows, got {}",
            ZS_ROWS,
            rows.len()
        )));
    }
    let mut result = Vec::with_capacity(ZS_ROWS);
    for row in rows {
        row.validate()?;
        let mut v = identity(TOTAL_VARS);
        apply_register_diff(&mut v, Register::R1, &row.r1);
        apply_register_diff(&mut v, Register::R2, &row.r2);
        apply_register_diff(&mut v, Register::R3, &row.r3);
        result.push(v);
    }
    Ok(result)
}
