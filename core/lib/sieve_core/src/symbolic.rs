//! Symbolic expansion of keystream bits into the 656-monomial system `C(r4)`.
//!
//! Grounded on `original_source/source/lfsr_state.c` (the `taps`/`l4`
//! accumulation loop) and `include/decrypt.h` (the `TOTAL_VARS`/`VAR_OFF_*`
//! layout). See spec section 4.C.

use gf2matrix::GF2Matrix;

use crate::error::CoreResult;
use crate::lfsr::{
    BLOCK_BITS, CompanionMatrices, ClockPattern, DISCARD_PREFIX, R1_LEN, R2_LEN, R3_LEN,
};

pub const TOTAL_VARS: usize = 656;

pub const VAR_OFF_R1: usize = 1;
pub const VAR_LEN_R1: usize = 171;
pub const VAR_OFF_R2: usize = 172;
pub const VAR_LEN_R2: usize = 231;
pub const VAR_OFF_R3: usize = 403;
pub const VAR_LEN_R3: usize = 253;

/// One of the three clocked registers feeding the symbolic system (R4 itself
/// never appears in the monomial vector: it is the sieve variable, not one of
/// the unknowns being solved for).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R1,
    R2,
    R3,
}

impl Register {
    pub fn len(self) -> usize {
        match self {
            Register::R1 => R1_LEN,
            Register::R2 => R2_LEN,
            Register::R3 => R3_LEN,
        }
    }

    pub fn var_offset(self) -> usize {
        match self {
            Register::R1 => VAR_OFF_R1,
            Register::R2 => VAR_OFF_R2,
            Register::R3 => VAR_OFF_R3,
        }
    }

    pub fn var_len(self) -> usize {
        match self {
            Register::R1 => VAR_LEN_R1,
            Register::R2 => VAR_LEN_R2,
            Register::R3 => VAR_LEN_R3,
        }
    }

    /// One-hot row indices for L's four columns: the three majority-input
    /// taps, then the linear output tap.
    fn initial_taps(self) -> [usize; 4] {
        match self {
            Register::R1 => [1, 6, 15, 11],
            Register::R2 => [3, 8, 14, 1],
            Register::R3 => [4, 15, 19, 0],
        }
    }

    /// Clock-mask bit (within a `ClockPattern` byte) that governs this
    /// register: bit 2 for R1, bit 1 for R2, bit 0 for R3 (spec section 3).
    fn mask_bit(self) -> u8 {
        match self {
            Register::R1 => 0b100,
            Register::R2 => 0b010,
            Register::R3 => 0b001,
        }
    }
}

/// The symbolic bilinear form behind A5/1-style majority clocking, tabulated
/// as an 8x8 lookup: `cross3(u, v) = u0*v1 ^ u1*v2 ^ u2*v0`, where `u`/`v`
/// pack three bits (bit 0/1/2 = tap 0/1/2) into a 3-bit index.
pub struct Cross3Lut([[u8; 8]; 8]);

impl Cross3Lut {
    pub fn build() -> Self {
        let mut table = [[0u8; 8]; 8];
        for u in 0..8usize {
            for v in 0..8usize {
                let u0 = (u >> 0) & 1;
                let u1 = (u >> 1) & 1;
                let v1 = (v >> 1) & 1;
                let u2 = (u >> 2) & 1;
                let v2 = (v >> 2) & 1;
                let v0 = (v >> 0) & 1;
                table[u][v] = ((u0 & v1) ^ (u1 & v2) ^ (u2 & v0)) as u8;
            }
        }
        Cross3Lut(table)
    }

    #[inline]
    pub fn eval(&self, u: u8, v: u8) -> u8 {
        self.0[u as usize][v as usize]
    }
}

/// Per-register working state during clock-pattern evaluation: a basis
/// matrix `L` of shape `(n, 4)` whose columns are the three majority-input
/// taps plus the linear output tap, advanced one clock at a time.
pub struct LSegment {
    register: Register,
    l: GF2Matrix,
}

impl LSegment {
    pub fn new(register: Register) -> Self {
        let n = register.len();
        let mut l = GF2Matrix::new(n, 4);
        for (col, &row) in register.initial_taps().iter().enumerate() {
            l.set(row, col, true);
        }
        LSegment { register, l }
    }

    /// `L <- Ai . L`, the linear transform corresponding to one clock of the
    /// underlying register.
    pub fn clock(&mut self, companion: &GF2Matrix) -> CoreResult<()> {
        self.l = companion.mul(&self.l)?;
        Ok(())
    }

    fn packed_taps(&self, row: usize) -> u8 {
        (self.l.get(row, 0) as u8) | ((self.l.get(row, 1) as u8) << 1) | ((self.l.get(row, 2) as u8) << 2)
    }

    fn linear_tap(&self, row: usize) -> bool {
        self.l.get(row, 3)
    }

    /// XORs this register's contribution to keystream bit `row_idx` of `c`
    /// (constant term at column 0, linear/quadratic terms in this register's
    /// own var block).
    pub fn contribute(&self, lut: &Cross3Lut, c: &mut GF2Matrix, row_idx: usize) {
        let n = self.register.len();
        let off = self.register.var_offset();
        let taps: Vec<u8> = (0..n).map(|u| self.packed_taps(u)).collect();
        let l4: Vec<bool> = (0..n).map(|u| self.linear_tap(u)).collect();

        let constant = lut.eval(taps[0], taps[0]) ^ (l4[0] as u8);
        c.xor_bit(row_idx, 0, constant == 1);

        for u in 1..n {
            let value = lut.eval(taps[u], taps[0])
                ^ lut.eval(taps[0], taps[u])
                ^ lut.eval(taps[u], taps[u])
                ^ (l4[u] as u8);
            c.xor_bit(row_idx, off + (u - 1), value == 1);
        }

        for u in 1..n {
            for v in (u + 1)..n {
                let idx = off + (n - 1) + quad_index(n, u, v);
                let value = lut.eval(taps[u], taps[v]) ^ lut.eval(taps[v], taps[u]);
                c.xor_bit(row_idx, idx, value == 1);
            }
        }
    }
}

/// Position of the `(u, v)` quadratic pair (`1 <= u < v < n`) within a
/// register's quadratic block, consistent with `(n-1) + C(n-1, 2)` total
/// contributions (spec section 4.C / section 8 boundary property).
pub fn quad_index(n: usize, u: usize, v: usize) -> usize {
    debug_assert!(1 <= u && u < v && v < n);
    let mut offset = 0usize;
    for i in 1..u {
        offset += n - 1 - i;
    }
    offset + (v - u - 1)
}

/// Builds the `208 x 656` symbolic system for one clock pattern: each row
/// `j` satisfies `row_j . v = z_j`, the `j`th post-discard keystream bit.
pub fn build_symbolic_system(
    companions: &CompanionMatrices,
    lut: &Cross3Lut,
    pattern: &ClockPattern,
) -> CoreResult<GF2Matrix> {
    let mut r1 = LSegment::new(Register::R1);
    let mut r2 = LSegment::new(Register::R2);
    let mut r3 = LSegment::new(Register::R3);
    let mut c = GF2Matrix::new(BLOCK_BITS, TOTAL_VARS);

    for (step, &mask) in pattern.iter().enumerate() {
        if mask & Register::R1.mask_bit() != 0 {
            r1.clock(&companions.a1)?;
        }
        if mask & Register::R2.mask_bit() != 0 {
            r2.clock(&companions.a2)?;
        }
        if mask & Register::R3.mask_bit() != 0 {
            r3.clock(&companions.a3)?;
        }
        // Clock before reading, matching keystream_generation_with_pattern_m4ri:
        // each step's output bit is read from the registers *after* this
        // step's conditional clock, not before it.
        if step >= DISCARD_PREFIX {
            let row = step - DISCARD_PREFIX;
            r1.contribute(lut, &mut c, row);
            r2.contribute(lut, &mut c, row);
            r3.contribute(lut, &mut c, row);
        }
    }

    Ok(c)
}

/// Ground-truth monomial vector built directly from concrete register bits
/// (rather than accumulated through [`LSegment`]). Used by this module's own
/// `build_symbolic_system`-vs-direct-simulation test and by `vdiff`'s
/// v_i-equivalence test (spec section 8's "direct enumeration of monomials"
/// / "v_i ... equals v_0 . V[i-1]" testable properties).
#[cfg(test)]
pub(crate) fn concrete_monomial_vector(r1: &[bool], r2: &[bool], r3: &[bool]) -> GF2Matrix {
    let mut v = GF2Matrix::new(1, TOTAL_VARS);
    v.set(0, 0, true);
    for (bits, register) in [(r1, Register::R1), (r2, Register::R2), (r3, Register::R3)] {
        let n = register.len();
        assert_eq!(bits.len(), n);
        assert!(bits[0], "register LSB must be 1");
        let off = register.var_offset();
        for u in 1..n {
            if bits[u] {
                v.set(0, off + (u - 1), true);
            }
        }
        for u in 1..n {
            for w in (u + 1)..n {
                if bits[u] && bits[w] {
                    v.set(0, off + (n - 1) + quad_index(n, u, w), true);
                }
            }
        }
    }
    v
}
