use std::io;

use stowage_uri::Algorithm;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("no digest available for algorithm {0}")]
    UnsupportedAlgorithm(Algorithm),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
