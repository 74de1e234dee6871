use std::path::PathBuf;
use std::time::Duration;

use stowage_uri::Algorithm;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} content cannot be fetched")]
    UnsupportedAlgorithm(Algorithm),

    #[error("download timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to write '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Rpc(#[from] stowage_rpc::Error),

    #[error(transparent)]
    Store(#[from] stowage_store::Error),

    #[error(transparent)]
    Verify(#[from] stowage_verify::Error),

    #[error(transparent)]
    Fs(#[from] stowage_fs::Error),
}

impl Error {
    /// Failures confined to a single candidate; the next candidate may
    /// still succeed.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::Verify(stowage_verify::Error::Mismatch { .. })
                | Self::Rpc(
                    stowage_rpc::Error::RequestFailed { .. }
                        | stowage_rpc::Error::Transport(_)
                        | stowage_rpc::Error::Framing(_)
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
