use std::path::PathBuf;

use coins_core::ser::SerError;
use coins_ecdsa::EcError;
use thiserror::Error;

/// Errors from loading fixtures or selecting backends
#[derive(Debug, Error)]
pub enum FixtureError {
    /// A fixture file could not be read
    #[error("Failed to read fixture {path:?}: {source}")]
    Io {
        /// The file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A fixture did not deserialize
    #[error(transparent)]
    Ser(#[from] SerError),

    /// A block index past the end of the fixture file
    #[error("Requested block {index}, but the fixture holds {available}")]
    MissingBlock {
        /// The requested height
        index: usize,
        /// How many blocks the fixture holds
        available: usize,
    },

    /// Backend selection failed
    #[error(transparent)]
    Ec(#[from] EcError),
}

/// Type alias for results in this crate
pub type FixtureResult<T> = Result<T, FixtureError>;
