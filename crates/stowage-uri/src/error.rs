#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed content uri '{uri}': {reason}")]
    Malformed { uri: String, reason: &'static str },

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, Error>;
