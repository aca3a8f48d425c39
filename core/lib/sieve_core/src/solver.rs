//! Incremental solvability checker (spec section 4.H): the expensive RREF of
//! `A^T` is computed once per unknown-block choice; each right-hand side
//! `b` is then tested for membership in `A`'s row space in a single linear
//! sweep over pivot columns.

use gf2matrix::GF2Matrix;

use crate::error::{CoreError, CoreResult};

/// Prepared state for repeated solvability checks against one fixed `A`.
pub struct SolverContext {
    /// `A^T` in reduced row-echelon form, `n x m` (`n` = `A`'s column count,
    /// `m` = `A`'s row count).
    at_rref: GF2Matrix,
    /// Pivot column of each of the first `rank` rows of `at_rref`.
    pivots: Vec<usize>,
    m: usize,
}

impl SolverContext {
    /// Prepares a solver for `A x = b` queries: computes `A^T`, reduces it
    /// to RREF, and records pivot columns.
    pub fn prepare(a: &GF2Matrix) -> Self {
        let mut at = a.transpose();
        let (_, pivots) = at.echelonize_with_pivots();
        SolverContext {
            at_rref: at,
            pivots,
            m: a.rows(),
        }
    }

    /// Tests whether `A x = b` has a solution over GF(2), for `b` an `m x 1`
    /// column vector.
    pub fn check(&self, b: &GF2Matrix) -> CoreResult<bool> {
        if b.rows() != self.m || b.cols() != 1 {
            return Err(CoreError::InvalidInput(format!(
                "b: expected {}x1, got {}x{}",
                self.m,
                b.rows(),
                b.cols()
            )));
        }

        let mut row = b.transpose(); // 1 x m
        for (pivot_row, &pivot_col) in self.pivots.iter().enumerate() {
            if row.get(0, pivot_col) {
                for col in 0..self.m {
                    if self.at_rref.get(pivot_row, col) {
                        row.xor_bit(0, col, true);
                    }
                }
            }
        }
        Ok(row.is_zero())
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn identity(n: usize) -> GF2Matrix {
        let mut m = GF2Matrix::new(n, n);
        for i in 0..n {
            m.set(i, i, true);
        }
        m
    }

    #[test]
    fn identity_system_is_always_solvable() {
        let a = identity(8);
        let ctx = SolverContext::prepare(&a);
        assert_eq!(ctx.rank(), 8);
        let mut b = GF2Matrix::new(8, 1);
        b.set(3, 0, true);
        b.set(7, 0, true);
        assert!(ctx.check(&b).unwrap());
    }

    #[test]
    fn zero_rows_only_solvable_for_zero_b() {
        let a = GF2Matrix::new(4, 3); // all-zero A: only b=0 is reachable
        let ctx = SolverContext::prepare(&a);
        assert_eq!(ctx.rank(), 0);
        let zero_b = GF2Matrix::new(4, 1);
        assert!(ctx.check(&zero_b).unwrap());

        let mut nonzero_b = GF2Matrix::new(4, 1);
        nonzero_b.set(1, 0, true);
        assert!(!ctx.check(&nonzero_b).unwrap());
    }

    #[test]
    fn rejects_wrong_shaped_b() {
        let a = identity(5);
        let ctx = SolverContext::prepare(&a);
        let bad_b = GF2Matrix::new(4, 1);
        assert!(ctx.check(&bad_b).is_err());
    }

    #[test]
    fn matches_direct_rank_test_on_random_systems() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
        for _ in 0..50 {
            let a = GF2Matrix::random(672, 656, &mut rng);
            let b = GF2Matrix::random(672, 1, &mut rng);

            let ctx = SolverContext::prepare(&a);
            let incremental = ctx.check(&b).unwrap();

            // Direct reference: rank(A) == rank([A | b]).
            let mut at = a.transpose();
            let rank_a = at.echelonize();

            let mut wide = GF2Matrix::new(672, 657);
            for r in 0..672 {
                for c in 0..656 {
                    if a.get(r, c) {
                        wide.set(r, c, true);
                    }
                }
                if b.get(r, 0) {
                    wide.set(r, 656, true);
                }
            }
            let mut wide_t = wide.transpose();
            let rank_ab = wide_t.echelonize();

            assert_eq!(incremental, rank_a == rank_ab, "mismatch on random system");
        }
    }
}
