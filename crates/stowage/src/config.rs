use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stowage_fetch::FetchOptions;
use stowage_store::{DEFAULT_CHUNK_SIZE, StoreOptions};

use crate::{Error, Result};

pub const DEFAULT_DAEMON_URL: &str = "http://localhost:20431";

/// Whether the client talks to a daemon or only to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Offline,
    Daemon,
}

/// Client configuration. Built once at startup and never mutated afterwards.
///
/// ```toml
/// storage_dir = "/data/stowage"
/// daemon_url = "http://localhost:20431"
/// offline = false
/// download_timeout = 300
///
/// [api_headers]
/// authorization = "Bearer ..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage_dir:      PathBuf,
    pub daemon_url:       String,
    /// Sent with every daemon request.
    pub api_headers:      BTreeMap<String, String>,
    pub offline:          bool,
    /// Hard-link committed files instead of copying. Only for callers that
    /// never modify a file after storing it.
    pub use_hard_links:   bool,
    pub chunk_size:       u64,
    /// Per-candidate download limit, in seconds.
    pub download_timeout: Option<u64>,
    /// After a daemon-side store, check the object is visible in
    /// `storage_dir` with the expected size.
    pub check_storage:    bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir:      default_storage_dir(),
            daemon_url:       DEFAULT_DAEMON_URL.to_string(),
            api_headers:      BTreeMap::new(),
            offline:          false,
            use_hard_links:   false,
            chunk_size:       DEFAULT_CHUNK_SIZE,
            download_timeout: None,
            check_storage:    true,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stowage")
        .join("storage")
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn connectivity(&self) -> Connectivity {
        if self.offline {
            Connectivity::Offline
        } else {
            Connectivity::Daemon
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new()
            .use_hard_links(self.use_hard_links)
            .chunk_size(self.chunk_size)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new().download_timeout(self.download_timeout.map(Duration::from_secs))
    }
}
