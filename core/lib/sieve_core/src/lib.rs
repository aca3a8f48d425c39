//! GF(2) cryptanalytic sieve over the A5/1-family clock-control register.
//!
//! Ties together the companion matrices and clock-pattern table
//! ([`lfsr`]), the symbolic keystream expansion ([`symbolic`]), the
//! `CtHt` cache ([`ctht`]), the inter-block propagator ([`vdiff`]), the
//! per-block system assembler ([`assembler`]), the error-configuration
//! enumerator ([`errors_config`]), the incremental solver ([`solver`]), and
//! the per-r4 driver ([`driver`]) behind one [`context::CoreContext`].

pub mod assembler;
pub mod context;
pub mod ctht;
pub mod driver;
pub mod error;
pub mod errors_config;
pub mod lfsr;
pub mod solver;
pub mod symbolic;
pub mod vdiff;

pub use context::CoreContext;
pub use driver::{R4Result, Verdict};
pub use error::{CoreError, CoreResult};
