//! `CoreContext`: the single explicitly constructed value that replaces
//! every module-level mutable global the source kept (`A1..A4`, `zS_*`,
//! `clock_patterns`, `CtHt_cache`, `H`, `Ht`, `V_DIFF_MATS`; see spec
//! section 9 / REDESIGN FLAGS). Every public sieve operation takes a
//! `&CoreContext` rather than reaching for process-wide state.

use gf2matrix::GF2Matrix;

use crate::assembler::H_ROWS;
use crate::ctht::{self, CtHtEntry};
use crate::error::{CoreError, CoreResult};
use crate::lfsr::{ClockTable, CompanionMatrices, BLOCK_BITS, R4_SPACE};
use crate::symbolic::{Cross3Lut, TOTAL_VARS};
use crate::vdiff::{self, ZsRow, ZS_ROWS};

/// Columns of `G^T`, the outer code's generator transpose.
pub const GT_COLS: usize = 160;

/// Everything the sieve needs, held by value and handed out by shared
/// reference: companion matrices, clock table, the parity-check code, the
/// inter-block propagators, and (optionally) the bulk `CtHt` cache.
pub struct CoreContext {
    companions: CompanionMatrices,
    lut: Cross3Lut,
    clock_table: ClockTable,
    h: GF2Matrix,
    ht: GF2Matrix,
    gt: GF2Matrix,
    v_diff: Vec<GF2Matrix>,
    ctht: Option<Vec<CtHtEntry>>,
}

impl CoreContext {
    /// Builds a context from the loaded artifacts. Companion matrices and
    /// the `cross3` LUT are (re)derived rather than loaded, since they are
    /// pure functions of the hard-coded feedback polynomials (spec section
    /// 6); `h`, `gt`, `clock_table`, and `zs_rows` come from `sieve_io`.
    pub fn new(
        h: GF2Matrix,
        gt: GF2Matrix,
        clock_table: ClockTable,
        zs_rows: &[ZsRow],
    ) -> CoreResult<Self> {
        if h.rows() != H_ROWS || h.cols() != BLOCK_BITS {
            return Err(CoreError::InvalidInput(format!(
                "H: expected {}x{}, got {}x{}",
                H_ROWS,
                BLOCK_BITS,
                h.rows(),
                h.cols()
            )));
        }
        if gt.rows() != BLOCK_BITS || gt.cols() != GT_COLS {
            return Err(CoreError::InvalidInput(format!(
                "Gt: expected {}x{}, got {}x{}",
                BLOCK_BITS,
                GT_COLS,
                gt.rows(),
                gt.cols()
            )));
        }
        if zs_rows.len() != ZS_ROWS {
            return Err(CoreError::InvalidInput(format!(
                "zS: expected {} rows, got {}",
                ZS_ROWS,
                zs_rows.len()
            )));
        }

        let companions = CompanionMatrices::build();
        companions.verify()?;
        let lut = Cross3Lut::build();
        let v_diff = vdiff::build_v_matrices(zs_rows)?;
        let ht = h.transpose();

        Ok(CoreContext {
            companions,
            lut,
            clock_table,
            h,
            ht,
            gt,
            v_diff,
            ctht: None,
        })
    }

    /// Runs the bulk `CtHt` precomputation (spec section 4.D) and returns a
    /// new context holding the populated cache. Consumes `self` rather than
    /// mutating in place, per REDESIGN FLAGS ("precompute methods return a
    /// new context").
    pub fn with_ctht_cache(mut self) -> CoreResult<Self> {
        let cache = ctht::build_all(&self.companions, &self.lut, &self.clock_table, &self.ht)?;
        self.ctht = Some(cache);
        Ok(self)
    }

    /// `CtHt[r4]`, served from the bulk cache if present, else built lazily
    /// (spec section 4.D's `prepare_for`).
    pub fn ctht_for(&self, r4: u16) -> CoreResult<CtHtEntry> {
        match &self.ctht {
            Some(cache) => Ok(cache[r4 as usize].clone()),
            None => ctht::build_one(&self.companions, &self.lut, &self.clock_table, &self.ht, r4),
        }
    }

    pub fn v_diff(&self) -> &[GF2Matrix] {
        &self.v_diff
    }

    pub fn clock_table(&self) -> &ClockTable {
        &self.clock_table
    }

    pub fn h(&self) -> &GF2Matrix {
        &self.h
    }

    pub fn has_bulk_ctht_cache(&self) -> bool {
        self.ctht.is_some()
    }

    /// Sanity check equivalent to the source's `verify_companion_matrices`
    /// plus the `H . G^T == 0` code-consistency check (spec section 8,
    /// testable property "H . G^T = 0"). Cheap; safe to call unconditionally
    /// at construction in debug builds, or explicitly from a CLI
    /// `--verify` flag.
    pub fn sanity_check(&self) -> CoreResult<()> {
        self.companions.verify()?;
        if self.companions.a1.rows() != crate::lfsr::R1_LEN
            || self.companions.a2.rows() != crate::lfsr::R2_LEN
            || self.companions.a3.rows() != crate::lfsr::R3_LEN
        {
            return Err(CoreError::InternalInvariant(
                "companion matrix dimensions do not match register lengths".into(),
            ));
        }
        let hgt = self.h.mul(&self.gt)?;
        if !hgt.is_zero() {
            return Err(CoreError::InternalInvariant("H . G^T != 0".into()));
        }
        if self.v_diff.len() != ZS_ROWS {
            return Err(CoreError::InternalInvariant(format!(
                "expected {} v-diff matrices, found {}",
                ZS_ROWS,
                self.v_diff.len()
            )));
        }
        for v in &self.v_diff {
            if v.rows() != TOTAL_VARS || v.cols() != TOTAL_VARS {
                return Err(CoreError::InternalInvariant(
                    "v-diff matrix has wrong shape".into(),
                ));
            }
        }
        let expected_table_len = R4_SPACE * crate::lfsr::CLOCK_PATTERN_LEN;
        if self.clock_table.as_bytes().len() != expected_table_len {
            return Err(CoreError::InternalInvariant(
                "clock pattern table has the wrong length".into(),
            ));
        }
        Ok(())
    }
}
