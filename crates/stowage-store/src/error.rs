use std::path::PathBuf;

use stowage_uri::Algorithm;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {algorithm} hash '{hash}'")]
    InvalidHash { algorithm: Algorithm, hash: String },

    #[error("objects addressed by {0} cannot be committed")]
    UnsupportedAlgorithm(Algorithm),

    #[error("{algorithm}://{hash} is not in the store")]
    NotFound { algorithm: Algorithm, hash: String },

    #[error("cannot concatenate chunks: missing chunk {0}")]
    MissingChunk(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] stowage_fs::Error),

    #[error(transparent)]
    Verify(#[from] stowage_verify::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
