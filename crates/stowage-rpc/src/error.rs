use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protocol framing error: {0}")]
    Framing(String),

    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transport(err: impl Into<BoxError>) -> Self { Self::Transport(err.into()) }

    pub fn is_framing(&self) -> bool { matches!(self, Self::Framing(_)) }
}

pub type Result<T> = std::result::Result<T, Error>;
