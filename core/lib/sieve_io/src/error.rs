use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading or validating an on-disk artifact. Wraps
/// rather than duplicates [`sieve_core::CoreError`] so a malformed file and
/// an internal algebra invariant are never confused at the call site (spec
/// section 7: `FileIO` is distinct from `InvalidInput`/`InternalInvariant`).
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has wrong length: expected {expected} bytes, got {actual}")]
    WrongLength {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Core(#[from] sieve_core::CoreError),

    #[error(transparent)]
    Matrix(#[from] gf2matrix::GF2Error),

    #[error("environment variable {0} is not a valid number")]
    BadEnvNumber(String),
}

pub type IoResult<T> = Result<T, IoError>;
