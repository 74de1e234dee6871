use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} needs the daemon, but the client is offline")]
    Offline(&'static str),

    #[error("daemon reported failure: {0}")]
    Daemon(String),

    #[error("unexpected daemon response: {0}")]
    UnexpectedResponse(String),

    #[error("{}", describe_inconsistency(.path, .expected, .actual))]
    StorageInconsistency {
        path:     PathBuf,
        expected: u64,
        /// `None` when the object is absent.
        actual:   Option<u64>,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    ConfigParse {
        path:   PathBuf,
        source: toml::de::Error,
    },

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Uri(#[from] stowage_uri::Error),

    #[error(transparent)]
    Rpc(#[from] stowage_rpc::Error),

    #[error(transparent)]
    Fetch(#[from] stowage_fetch::Error),

    #[error(transparent)]
    Store(#[from] stowage_store::Error),

    #[error(transparent)]
    Fs(#[from] stowage_fs::Error),
}

fn describe_inconsistency(path: &std::path::Path, expected: &u64, actual: &Option<u64>) -> String {
    match actual {
        None => format!(
            "daemon stored the file but '{}' does not exist; storage is not yet synchronised",
            path.display()
        ),
        Some(actual) => format!(
            "daemon stored the file but '{}' has {actual} bytes, expected {expected}",
            path.display()
        ),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
