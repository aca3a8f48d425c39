//! On-disk artifact loading, configuration, and (test-only) a reference
//! encryptor oracle for the sieve workspace — the I/O boundary around
//! `sieve_core`'s pure algebra.

pub mod artifacts;
pub mod config;
pub mod error;

#[cfg(any(test, feature = "oracle"))]
pub mod oracle;

pub use config::SieveConfig;
pub use error::{IoError, IoResult};
