//! Direct bit-level reference encryptor, used only to manufacture test
//! vectors (spec section 1: "the reference encrypt-side ... is used only as
//! an oracle for test vectors"). This is *not* the symbolic machinery under
//! test: it clocks one concrete `1 x n` state row per register through the
//! same companion matrices `sieve_core::lfsr` builds, rather than
//! propagating a 656-monomial symbolic system, so the sieve has an
//! independent ground truth to grade itself against.
//!
//! Grounded on `original_source/source/encrypt.c` (`key_scheduling_m4ri`,
//! `bit_reversal_m4ri`, `key_injection_m4ri`,
//! `keystream_generation_with_pattern_m4ri`) for deriving the *one* initial
//! register state from a key and nonce, and on `expand_states_linearized_m4ri`
//! / `encrypt_from_state_precise_m4ri` for how the 15 per-block states relate
//! to it: block `i`'s state is block 0's state XORed against a fixed,
//! precomputed `zS` row (`S[i] = S0 ^ zS[i-1]`), *not* a fresh key-schedule
//! run per block. In particular R4 — and therefore the clock pattern — is the
//! same across all 15 blocks of one message; only the R1/R2/R3 components
//! differ block to block, exactly as `sieve_core::vdiff::ZsRow` models them.
//! Kept behind the `oracle` feature / `cfg(test)`: never linked into the
//! sieve driver itself (spec section 3's "not exposed as a production
//! encryption API").

use gf2matrix::GF2Matrix;
use sieve_core::lfsr::{ClockTable, CompanionMatrices, BLOCK_BITS, DISCARD_PREFIX};
use sieve_core::vdiff::ZsRow;

pub const KEY_SIZE: usize = 64;
pub const NONCE_SIZE: usize = 19;

fn maj(a: bool, b: bool, c: bool) -> bool {
    (a & b) ^ (b & c) ^ (c & a)
}

/// `key_scheduling_m4ri`: folds nonce bits into three ranges of the key.
fn key_scheduling(key: &[bool; KEY_SIZE], nonce: &[bool; NONCE_SIZE]) -> [bool; KEY_SIZE] {
    let mut a = *key;
    for i in 3..=15 {
        a[i] ^= nonce[i + 3];
    }
    for i in 22..=23 {
        a[i] ^= nonce[i - 18];
    }
    for i in 60..=63 {
        a[i] ^= nonce[i - 60];
    }
    a
}

/// `bit_reversal_m4ri`: reverses bit order within each of the four 16-bit
/// blocks of the scheduled key.
fn bit_reversal(a: &[bool; KEY_SIZE]) -> [bool; KEY_SIZE] {
    let mut aa = [false; KEY_SIZE];
    for block in 0..4 {
        for j in 0..16 {
            aa[block * 16 + (15 - j)] = a[block * 16 + j];
        }
    }
    aa
}

/// The four clocked registers' concrete state, as `1 x n` row vectors.
#[derive(Clone)]
pub struct RegisterState {
    pub r1: GF2Matrix,
    pub r2: GF2Matrix,
    pub r3: GF2Matrix,
    pub r4: GF2Matrix,
}

fn zero_state() -> RegisterState {
    RegisterState {
        r1: GF2Matrix::new(1, 19),
        r2: GF2Matrix::new(1, 22),
        r3: GF2Matrix::new(1, 23),
        r4: GF2Matrix::new(1, 17),
    }
}

/// `lfsr_matrix_clock(lfsr, A)`: a concrete `1 x n` row state clocks by
/// right-multiplication, `state <- state . A` (spec section 4.B) — distinct
/// from `LSegment`'s `L <- Ai . L` left-multiplication, which tracks a
/// 4-column basis of symbolic coefficients rather than one concrete state.
fn clock_all(state: &mut RegisterState, companions: &CompanionMatrices) {
    state.r1 = state.r1.mul(&companions.a1).unwrap();
    state.r2 = state.r2.mul(&companions.a2).unwrap();
    state.r3 = state.r3.mul(&companions.a3).unwrap();
    state.r4 = state.r4.mul(&companions.a4).unwrap();
}

/// `key_injection_m4ri`: clocks all four registers once per scheduled-key
/// bit, XORing that bit into each register's LSB whenever it is set, then
/// forces every LSB back to 1 (spec's invariant that the register's LSB is
/// always 1).
fn key_injection(aa: &[bool; KEY_SIZE], companions: &CompanionMatrices) -> RegisterState {
    let mut state = zero_state();
    for &bit in aa.iter() {
        clock_all(&mut state, companions);
        if bit {
            let cur = state.r1.get(0, 0);
            state.r1.set(0, 0, !cur);
            let cur = state.r2.get(0, 0);
            state.r2.set(0, 0, !cur);
            let cur = state.r3.get(0, 0);
            state.r3.set(0, 0, !cur);
            let cur = state.r4.get(0, 0);
            state.r4.set(0, 0, !cur);
        }
    }
    state.r1.set(0, 0, true);
    state.r2.set(0, 0, true);
    state.r3.set(0, 0, true);
    state.r4.set(0, 0, true);
    state
}

/// `expand_states_linearized_m4ri`: block `i`'s state as block 0's state
/// XORed against one `zS` row, flipping R1/R2/R3 bits `1..n` (never the
/// LSB, which stays forced to 1) wherever the row's corresponding
/// difference bit is set. R4 is untouched: the clock pattern is shared by
/// every block of a message.
pub fn apply_zs_diff(state0: &RegisterState, diff: &ZsRow) -> RegisterState {
    let mut state = state0.clone();
    let flip = |row: &mut GF2Matrix, bits: &[bool]| {
        for (j, &set) in bits.iter().enumerate() {
            if set {
                let pos = j + 1;
                let cur = row.get(0, pos);
                row.set(0, pos, !cur);
            }
        }
    };
    flip(&mut state.r1, &diff.r1);
    flip(&mut state.r2, &diff.r2);
    flip(&mut state.r3, &diff.r3);
    state
}

/// `encrypt_from_state_precise_m4ri`'s per-message state table: block 0 is
/// `state0` verbatim, blocks `1..=14` are `state0` shifted by each of the 14
/// `zS` rows in order.
pub fn expand_states(state0: &RegisterState, zs: &[ZsRow]) -> Vec<RegisterState> {
    let mut states = Vec::with_capacity(zs.len() + 1);
    states.push(state0.clone());
    for row in zs {
        states.push(apply_zs_diff(state0, row));
    }
    states
}

/// `state->R4` bits `1..17`, packed into the 16-bit clock-table index.
pub fn r4_index_of(state: &RegisterState) -> u16 {
    let mut idx = 0u16;
    for k in 1..17 {
        if state.r4.get(0, k) {
            idx |= 1 << (k - 1);
        }
    }
    idx
}

/// `keystream_generation_with_pattern_m4ri`: clocks R1/R2/R3 (R4 is not
/// touched again: its initial value already selected the pattern) through
/// the 458-step pattern, discarding the first 250 steps and reading one
/// majority-clocked output bit per remaining step.
pub fn generate_keystream(
    state: &RegisterState,
    pattern: &[u8],
    companions: &CompanionMatrices,
) -> GF2Matrix {
    let mut r1 = state.r1.clone();
    let mut r2 = state.r2.clone();
    let mut r3 = state.r3.clone();
    let mut z = GF2Matrix::new(1, BLOCK_BITS);

    for (step, &mask) in pattern.iter().enumerate() {
        if mask & 0b100 != 0 {
            r1 = r1.mul(&companions.a1).unwrap();
        }
        if mask & 0b010 != 0 {
            r2 = r2.mul(&companions.a2).unwrap();
        }
        if mask & 0b001 != 0 {
            r3 = r3.mul(&companions.a3).unwrap();
        }
        if step >= DISCARD_PREFIX {
            let maj1 = maj(r1.get(0, 1), r1.get(0, 6), r1.get(0, 15));
            let maj2 = maj(r2.get(0, 3), r2.get(0, 8), r2.get(0, 14));
            let maj3 = maj(r3.get(0, 4), r3.get(0, 15), r3.get(0, 19));
            let bit = maj1 ^ maj2 ^ maj3 ^ r1.get(0, 11) ^ r2.get(0, 1) ^ r3.get(0, 0);
            z.set(0, step - DISCARD_PREFIX, bit);
        }
    }
    z
}

/// `key_scheduling_m4ri` + `bit_reversal_m4ri` + `key_injection_m4ri` end to
/// end: key + nonce -> the *single* initial register state for a message.
/// Every one of a message's 15 blocks descends from this one state via
/// [`expand_states`]; there is no per-block key schedule.
pub fn base_state_for_key_nonce(
    key: &[bool; KEY_SIZE],
    nonce: &[bool; NONCE_SIZE],
    companions: &CompanionMatrices,
) -> RegisterState {
    let a = key_scheduling(key, nonce);
    let aa = bit_reversal(&a);
    key_injection(&aa, companions)
}

/// One block's 208-bit keystream and the ground-truth R4 (full 17-bit word,
/// LSB forced to 1) that selected the clock pattern, for an already-expanded
/// per-block state.
pub fn keystream_for_state(
    state: &RegisterState,
    clock_table: &ClockTable,
    companions: &CompanionMatrices,
) -> (GF2Matrix, u16) {
    let r4_index = r4_index_of(state);
    let pattern = clock_table.pattern(r4_index);
    (generate_keystream(state, pattern, companions), r4_index)
}

/// Packs a plaintext block (20 bytes = 160 bits, MSB-first) and multiplies
/// by the generator `G` to produce its `1 x 208` encoded row
/// (`encode_plaintext_m4ri`). `gt` is the `208 x 160` matrix loaded from
/// `Gt.bin` (spec section 6) — the same shape `CoreContext` stores — so this
/// transposes it once to get the `160 x 208` `G` the multiplication needs.
pub fn encode_block(plaintext_block: &[u8; 20], gt: &GF2Matrix) -> GF2Matrix {
    let mut p = GF2Matrix::new(1, 160);
    for (i, &byte) in plaintext_block.iter().enumerate() {
        for k in 0..8 {
            p.set(0, i * 8 + k, (byte >> (7 - k)) & 1 == 1);
        }
    }
    p.mul(&gt.transpose()).unwrap()
}

/// Full 15-block encryption oracle: `encrypt_from_state_precise_m4ri`'s flow
/// end to end, including the one/two-bit error injection hooks spec section
/// 8's "Concrete scenarios" exercise. `plaintext` must be exactly
/// `15 * 20 = 300` bytes and `zs` exactly 14 rows (spec section 4.E).
pub fn encrypt(
    key: &[bool; KEY_SIZE],
    nonce: &[bool; NONCE_SIZE],
    plaintext: &[u8],
    gt: &GF2Matrix,
    s: &GF2Matrix,
    zs: &[ZsRow],
    companions: &CompanionMatrices,
    clock_table: &ClockTable,
    errors: &[(usize, usize)],
) -> (Vec<GF2Matrix>, u16) {
    assert_eq!(plaintext.len(), 15 * 20, "oracle plaintext must be 300 bytes");
    assert_eq!(zs.len(), 14, "oracle needs exactly 14 zS rows");

    let state0 = base_state_for_key_nonce(key, nonce, companions);
    let states = expand_states(&state0, zs);

    let mut blocks = Vec::with_capacity(15);
    let mut true_r4 = None;
    for (i, state) in states.iter().enumerate() {
        let (keystream, r4_index) = keystream_for_state(state, clock_table, companions);
        if i == 0 {
            true_r4 = Some(r4_index);
        }
        debug_assert_eq!(
            r4_index,
            true_r4.unwrap(),
            "R4 (and thus the clock pattern) must be identical across all blocks of a message"
        );

        let mut block_bytes = [0u8; 20];
        block_bytes.copy_from_slice(&plaintext[i * 20..(i + 1) * 20]);
        let mut c = encode_block(&block_bytes, gt);
        c.add_assign(&keystream).unwrap();
        c.add_assign(s).unwrap();

        for &(err_block, err_bit) in errors {
            if err_block == i {
                let cur = c.get(0, err_bit);
                c.set(0, err_bit, !cur);
            }
        }
        blocks.push(c);
    }
    (blocks, true_r4.expect("at least one block"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::symbolic::Register;

    struct Lcg(u64);
    impl Lcg {
        fn next_bit(&mut self) -> bool {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
            (self.0 >> 63) & 1 == 1
        }
    }

    fn toy_key(seed: u64) -> [bool; KEY_SIZE] {
        let mut lcg = Lcg(seed);
        let mut key = [false; KEY_SIZE];
        for bit in key.iter_mut() {
            *bit = lcg.next_bit();
        }
        key
    }

    fn toy_nonce(seed: u64) -> [bool; NONCE_SIZE] {
        let mut lcg = Lcg(seed);
        let mut nonce = [false; NONCE_SIZE];
        for bit in nonce.iter_mut() {
            *bit = lcg.next_bit();
        }
        nonce
    }

    fn toy_zs_rows(seed: u64) -> Vec<ZsRow> {
        let mut lcg = Lcg(seed);
        let mut bits = |n: usize, lcg: &mut Lcg| (0..n).map(|_| lcg.next_bit()).collect::<Vec<bool>>();
        (0..14)
            .map(|_| ZsRow {
                r1: bits(Register::R1.len() - 1, &mut lcg),
                r2: bits(Register::R2.len() - 1, &mut lcg),
                r3: bits(Register::R3.len() - 1, &mut lcg),
                r4: vec![false; 16],
            })
            .collect()
    }

    #[test]
    fn bit_reversal_is_involution() {
        let mut a = [false; KEY_SIZE];
        a[0] = true;
        a[15] = true;
        a[16] = true;
        let aa = bit_reversal(&a);
        let back = bit_reversal(&aa);
        assert_eq!(a, back);
    }

    #[test]
    fn same_state_yields_same_keystream() {
        let companions = CompanionMatrices::build();
        let clock_table = ClockTable::build();
        let key = toy_key(7);
        let nonce = toy_nonce(123);
        let state = base_state_for_key_nonce(&key, &nonce, &companions);
        let (z1, r4a) = keystream_for_state(&state, &clock_table, &companions);
        let (z2, r4b) = keystream_for_state(&state, &clock_table, &companions);
        assert_eq!(z1, z2);
        assert_eq!(r4a, r4b);
    }

    #[test]
    fn zs_expansion_preserves_register_lsbs() {
        let companions = CompanionMatrices::build();
        let key = toy_key(11);
        let nonce = toy_nonce(456);
        let state0 = base_state_for_key_nonce(&key, &nonce, &companions);
        let zs = toy_zs_rows(99);
        let states = expand_states(&state0, &zs);
        assert_eq!(states.len(), 15);
        for state in &states {
            assert!(state.r1.get(0, 0));
            assert!(state.r2.get(0, 0));
            assert!(state.r3.get(0, 0));
            assert!(state.r4.get(0, 0));
        }
    }

    #[test]
    fn all_blocks_of_a_message_share_the_same_r4() {
        let companions = CompanionMatrices::build();
        let clock_table = ClockTable::build();
        let key = toy_key(13);
        let gt = GF2Matrix::new(BLOCK_BITS, 160);
        let s = GF2Matrix::new(1, BLOCK_BITS);
        let plaintext = vec![b'A'; 300];
        let nonce = toy_nonce(789);
        let zs = toy_zs_rows(314);
        let (blocks, true_r4) =
            encrypt(&key, &nonce, &plaintext, &gt, &s, &zs, &companions, &clock_table, &[]);
        assert_eq!(blocks.len(), 15);
        for b in &blocks {
            assert_eq!(b.rows(), 1);
            assert_eq!(b.cols(), BLOCK_BITS);
        }
        let _ = true_r4;
    }
}
