//! Error-configuration enumerator (spec section 4.G). Named `errors_config`
//! rather than `error` so it doesn't collide with this crate's `error`
//! module (`CoreError`).

use gf2matrix::GF2Matrix;

use crate::assembler::{H_ROWS, NUM_BLOCKS};
use crate::error::{CoreError, CoreResult};
use crate::lfsr::BLOCK_BITS;

/// Per-block error hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// No error hypothesized on this block.
    None,
    /// This is the one block whose error position is left as an unknown to
    /// be solved for.
    UnknownPosition,
    /// This block is hypothesized to have exactly one bit error at a known
    /// position.
    KnownPosition(usize),
}

/// One full configuration: the unknown block plus, for every other block,
/// a [`BlockStatus`] (always `None` or, for exactly one other block,
/// `KnownPosition`).
#[derive(Debug, Clone)]
pub struct ErrorConfig {
    pub unknown_block: usize,
    pub statuses: [BlockStatus; NUM_BLOCKS],
}

/// `H . e_p`, the syndrome of a single-bit error at column `p`, i.e. column
/// `p` of `H` itself.
pub fn syndrome_for_position(h: &GF2Matrix, p: usize) -> CoreResult<GF2Matrix> {
    if h.rows() != H_ROWS || h.cols() != BLOCK_BITS {
        return Err(CoreError::InvalidInput(format!(
            "H: expected {}x{}, got {}x{}",
            H_ROWS,
            BLOCK_BITS,
            h.rows(),
            h.cols()
        )));
    }
    if p >= BLOCK_BITS {
        return Err(CoreError::InvalidInput(format!(
            "bit position {} out of range [0, {})",
            p, BLOCK_BITS
        )));
    }
    let mut syn = GF2Matrix::new(H_ROWS, 1);
    for row in 0..H_ROWS {
        if h.get(row, p) {
            syn.set(row, 0, true);
        }
    }
    Ok(syn)
}

/// Precomputed syndromes `H . e_p` for every `p in [0, 208)`, shared across
/// every configuration that hypothesizes a known-position error (spec
/// section 4.G: "compute syndrome ... cache it").
pub struct SyndromeCache {
    syndromes: Vec<GF2Matrix>,
}

impl SyndromeCache {
    pub fn build(h: &GF2Matrix) -> CoreResult<Self> {
        let syndromes = (0..BLOCK_BITS)
            .map(|p| syndrome_for_position(h, p))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(SyndromeCache { syndromes })
    }

    pub fn get(&self, p: usize) -> &GF2Matrix {
        &self.syndromes[p]
    }
}

/// Generates exactly `15 + 15*14*208 = 43,695` configurations: 15
/// "unknown-only" plus `15*14*208` "unknown + one other known-position"
/// (spec section 4.G).
pub fn enumerate_configs() -> Vec<ErrorConfig> {
    let mut configs = Vec::with_capacity(NUM_BLOCKS + NUM_BLOCKS * (NUM_BLOCKS - 1) * BLOCK_BITS);

    for unknown_block in 0..NUM_BLOCKS {
        let mut statuses = [BlockStatus::None; NUM_BLOCKS];
        statuses[unknown_block] = BlockStatus::UnknownPosition;
        configs.push(ErrorConfig {
            unknown_block,
            statuses,
        });
    }

    for unknown_block in 0..NUM_BLOCKS {
        for known_block in 0..NUM_BLOCKS {
            if known_block == unknown_block {
                continue;
            }
            for p in 0..BLOCK_BITS {
                let mut statuses = [BlockStatus::None; NUM_BLOCKS];
                statuses[unknown_block] = BlockStatus::UnknownPosition;
                statuses[known_block] = BlockStatus::KnownPosition(p);
                configs.push(ErrorConfig {
                    unknown_block,
                    statuses,
                });
            }
        }
    }

    configs
}

/// Total configuration count, per spec section 4.G: `15 + 15*14*208`.
pub const TOTAL_CONFIGS: usize = NUM_BLOCKS + NUM_BLOCKS * (NUM_BLOCKS - 1) * BLOCK_BITS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_count_matches_spec_formula() {
        assert_eq!(TOTAL_CONFIGS, 43_695);
        assert_eq!(enumerate_configs().len(), TOTAL_CONFIGS);
    }

    #[test]
    fn every_config_has_exactly_one_unknown() {
        for config in enumerate_configs() {
            let unknown_count = config
                .statuses
                .iter()
                .filter(|s| matches!(s, BlockStatus::UnknownPosition))
                .count();
            assert_eq!(unknown_count, 1);
            assert!(matches!(
                config.statuses[config.unknown_block],
                BlockStatus::UnknownPosition
            ));
        }
    }

    #[test]
    fn at_most_one_known_position_per_config() {
        for config in enumerate_configs() {
            let known_count = config
                .statuses
                .iter()
                .filter(|s| matches!(s, BlockStatus::KnownPosition(_)))
                .count();
            assert!(known_count <= 1);
        }
    }

    #[test]
    fn syndrome_for_position_is_h_column() {
        let mut h = GF2Matrix::new(H_ROWS, BLOCK_BITS);
        h.set(3, 10, true);
        h.set(20, 10, true);
        let syn = syndrome_for_position(&h, 10).unwrap();
        assert!(syn.get(3, 0));
        assert!(syn.get(20, 0));
        assert!(!syn.get(0, 0));
    }

    #[test]
    fn syndrome_cache_matches_direct_computation() {
        let h = GF2Matrix::new(H_ROWS, BLOCK_BITS);
        let cache = SyndromeCache::build(&h).unwrap();
        for p in [0usize, 1, 207] {
            assert_eq!(cache.get(p), &syndrome_for_position(&h, p).unwrap());
        }
    }

    #[test]
    fn syndrome_rejects_out_of_range_position() {
        let h = GF2Matrix::new(H_ROWS, BLOCK_BITS);
        assert!(syndrome_for_position(&h, BLOCK_BITS).is_err());
    }
}
