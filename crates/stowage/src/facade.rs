use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stowage_fs::Workspace;
use stowage_rpc::HttpClient;
use stowage_store::Store;
use stowage_uri::{Algorithm, ContentUri};
use tracing::{Instrument, Span, debug, info};

use crate::{Error, Result};

pub const STORE_PATH: &str = "/store";

const DEFAULT_TEXT_NAME: &str = "file.txt";
const DEFAULT_JSON_NAME: &str = "file.json";
const SCRATCH_NAME: &str = "payload";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResponse {
    success:       bool,
    #[serde(default)]
    sha1:          Option<String>,
    #[serde(default)]
    manifest_sha1: Option<String>,
    #[serde(default)]
    error:         Option<String>,
}

/// Stores files and in-memory values, either directly in the local store
/// (offline) or through the daemon's store endpoint.
///
/// Values are first written to a scratch workspace that is readable by other
/// users and removed on every exit path.
pub struct StoreFacade<C> {
    store:         Store,
    daemon:        Option<Arc<C>>,
    check_storage: bool,
    span:          Span,
}

impl<C: HttpClient> StoreFacade<C> {
    pub fn offline(store: Store) -> Self {
        Self {
            store,
            daemon: None,
            check_storage: true,
            span: Span::none(),
        }
    }

    pub fn connected(store: Store, client: Arc<C>) -> Self {
        Self {
            daemon: Some(client),
            ..Self::offline(store)
        }
    }

    /// Whether a daemon-side store is followed by a look at the object in
    /// the shared storage directory.
    pub fn with_storage_check(mut self, enabled: bool) -> Self {
        self.check_storage = enabled;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_offline(&self) -> bool { self.daemon.is_none() }

    pub fn store(&self) -> &Store { &self.store }

    /// Store an existing file. The URI's basename defaults to the file's own
    /// name.
    pub async fn store_file(&self, path: &Path, basename: Option<&str>) -> Result<ContentUri> {
        let basename = basename
            .map(str::to_owned)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| SCRATCH_NAME.to_string());
        self.commit_path(path, &basename)
            .instrument(self.span.clone())
            .await
    }

    pub async fn store_bytes(&self, data: &[u8], basename: &str) -> Result<ContentUri> {
        let workspace = Workspace::new()?;
        let scratch = workspace.write(SCRATCH_NAME, data)?;
        workspace.share(&scratch)?;
        self.commit_path(&scratch, basename)
            .instrument(self.span.clone())
            .await
    }

    pub async fn store_text(&self, text: &str, basename: Option<&str>) -> Result<ContentUri> {
        self.store_bytes(text.as_bytes(), basename.unwrap_or(DEFAULT_TEXT_NAME))
            .await
    }

    /// Store `value` as compact JSON.
    pub async fn store_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        basename: Option<&str>,
    ) -> Result<ContentUri> {
        let bytes = serde_json::to_vec(value)?;
        self.store_bytes(&bytes, basename.unwrap_or(DEFAULT_JSON_NAME))
            .await
    }

    async fn commit_path(&self, path: &Path, basename: &str) -> Result<ContentUri> {
        let (hash, manifest) = match &self.daemon {
            None => {
                let committed = self.store.commit(path, Algorithm::Sha1)?;
                (committed.hash, committed.manifest)
            }
            Some(client) => self.upload(client, path).await?,
        };
        info!(%hash, basename, offline = self.is_offline(), "stored");

        let uri = ContentUri::new(Algorithm::Sha1, hash).with_basename(basename);
        Ok(match manifest {
            Some(manifest) => uri.with_manifest(manifest),
            None => uri,
        })
    }

    async fn upload(&self, client: &C, path: &Path) -> Result<(String, Option<String>)> {
        let expected = std::fs::metadata(path)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        debug!(path = %path.display(), size = expected, "uploading to daemon");
        let response: StoreResponse = serde_json::from_value(client.post_file(STORE_PATH, path).await?)?;
        if !response.success {
            return Err(Error::Daemon(
                response.error.unwrap_or_else(|| "store failed".to_string()),
            ));
        }
        let sha1 = response
            .sha1
            .ok_or_else(|| Error::UnexpectedResponse("store succeeded without a sha1".into()))?;

        if self.check_storage {
            self.check_stored(&sha1, expected)?;
        }
        Ok((sha1, response.manifest_sha1))
    }

    /// The daemon writes into the same storage directory this client reads.
    /// A missing or short object means the write has not become visible here.
    fn check_stored(&self, sha1: &str, expected: u64) -> Result<()> {
        let stored = self.store.path_for(sha1, Algorithm::Sha1, false)?;
        let actual = match stowage_fs::fresh_size(&stored) {
            Ok(size) => Some(size),
            Err(stowage_fs::Error::Stat { source, .. }) if source.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        if actual == Some(expected) {
            Ok(())
        } else {
            Err(Error::StorageInconsistency {
                path: stored,
                expected,
                actual,
            })
        }
    }
}
