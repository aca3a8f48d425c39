use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sieve core. See spec section 7: `InvalidInput` and
/// `InternalInvariant` are always fatal to the operation in progress (no
/// retry, no partial-failure mode); `FileIo` is reserved for `sieve_io`,
/// which wraps this type rather than duplicating it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error reading {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error(transparent)]
    Matrix(#[from] gf2matrix::GF2Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
