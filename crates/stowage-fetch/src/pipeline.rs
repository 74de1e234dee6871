use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use stowage_fs::Workspace;
use stowage_rpc::HttpClient;
use stowage_store::Store;
use stowage_uri::{Algorithm, ContentUri};
use stowage_verify::{AnyHasher, Hasher};
use tokio::io::AsyncWriteExt;
use tracing::{Instrument, Span, debug, info, warn};

use crate::location::CandidateLocation;
use crate::resolver::Resolver;
use crate::{Error, Result};

pub const DOWNLOAD_FILE_PATH: &str = "/downloadFile";

/// Outcome of a load. Absence is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Found(PathBuf),
    NotFound,
}

impl Fetched {
    pub fn is_found(&self) -> bool { matches!(self, Self::Found(_)) }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Upper bound on a single candidate's download. An elapsed timeout
    /// moves on to the next candidate.
    pub download_timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn new() -> Self { Self::default() }

    pub fn download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }
}

/// Resolve, download, verify and commit.
///
/// Candidates are tried in delivery order. A candidate whose bytes do not
/// hash to the requested value, or whose transfer fails, is logged and
/// skipped. Scratch files live in a workspace under the store's staging
/// directory, so dropping a pending load removes them.
pub struct FetchPipeline<C> {
    resolver: Resolver<C>,
    store:    Store,
    options:  FetchOptions,
    span:     Span,
}

impl<C: HttpClient> FetchPipeline<C> {
    pub fn new(client: Arc<C>, store: Store) -> Self {
        Self {
            resolver: Resolver::new(client),
            store,
            options: FetchOptions::default(),
            span: Span::none(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Record all pipeline work, lookups included, under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.resolver = self.resolver.with_span(span.clone());
        self.span = span;
        self
    }

    pub fn resolver(&self) -> &Resolver<C> { &self.resolver }

    pub fn store(&self) -> &Store { &self.store }

    /// Return the stored copy when present, otherwise fetch it.
    pub async fn load(&self, uri: &ContentUri) -> Result<Fetched> {
        if let Some(path) = self.store.locate(uri.hash(), uri.algorithm()) {
            debug!(parent: &self.span, %uri, "found in local store");
            return Ok(Fetched::Found(path));
        }
        self.resolve_and_fetch(uri).await
    }

    pub async fn resolve_and_fetch(&self, uri: &ContentUri) -> Result<Fetched> {
        let algorithm = uri.algorithm();
        if !algorithm.is_digest() {
            return Err(Error::UnsupportedAlgorithm(algorithm));
        }

        async {
            if let Fetched::Found(path) = self.fetch_object(uri.hash(), algorithm).await? {
                return Ok(Fetched::Found(path));
            }
            match uri.manifest() {
                Some(manifest) if algorithm == Algorithm::Sha1 => {
                    self.fetch_via_manifest(uri.hash(), manifest).await
                }
                _ => {
                    info!(%uri, "no candidate provided verified content");
                    Ok(Fetched::NotFound)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn fetch_object(&self, hash: &str, algorithm: Algorithm) -> Result<Fetched> {
        let mut locations = self.resolver.find_locations(hash, algorithm).await?;
        let workspace = Workspace::new_in(self.store.staging_dir())?;

        let mut attempt = 0usize;
        while let Some(location) = locations.next().await? {
            attempt += 1;
            let scratch = workspace.join(format!("candidate-{attempt}"));
            match self.download(&location, hash, algorithm, &scratch).await {
                Ok(size) => {
                    let committed = self.store.commit(&scratch, algorithm)?;
                    info!(
                        hash,
                        size,
                        node = %location.primary_node_id,
                        swarm = %location.swarm_name,
                        "fetched verified content"
                    );
                    return Ok(Fetched::Found(committed.path));
                }
                Err(e) if e.is_candidate_failure() => {
                    warn!(
                        hash,
                        attempt,
                        node = %location.primary_node_id,
                        swarm = %location.swarm_name,
                        error = %e,
                        "candidate rejected"
                    );
                    if let Err(e) = tokio::fs::remove_file(&scratch).await {
                        debug!(path = %scratch.display(), error = %e, "scratch file not removed");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        debug!(hash, attempts = attempt, "candidates exhausted");
        Ok(Fetched::NotFound)
    }

    async fn download(
        &self,
        location: &CandidateLocation,
        hash: &str,
        algorithm: Algorithm,
        dest: &Path,
    ) -> Result<u64> {
        let transfer = self.stream_to_scratch(location, hash, algorithm, dest);
        match self.options.download_timeout {
            Some(limit) => tokio::time::timeout(limit, transfer)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => transfer.await,
        }
    }

    async fn stream_to_scratch(
        &self,
        location: &CandidateLocation,
        hash: &str,
        algorithm: Algorithm,
        dest: &Path,
    ) -> Result<u64> {
        let io_err = |source| Error::Io {
            path: dest.to_path_buf(),
            source,
        };

        let client = self.resolver.client();
        let mut body = client
            .post_stream(DOWNLOAD_FILE_PATH, &location.download_request())
            .await?;
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
        let mut hasher = AnyHasher::for_algorithm(algorithm)?;

        let mut size = 0u64;
        while let Some(chunk) = body.next().await {
            let bytes = chunk?;
            hasher.update(&bytes);
            file.write_all(&bytes).await.map_err(io_err)?;
            size += bytes.len() as u64;
        }
        file.flush().await.map_err(io_err)?;

        hasher.verify(hash)?;
        Ok(size)
    }

    async fn fetch_via_manifest(&self, sha1: &str, manifest_hash: &str) -> Result<Fetched> {
        info!(hash = sha1, manifest = manifest_hash, "fetching by manifest");
        if !self.store.contains(manifest_hash, Algorithm::Sha1)
            && !self.fetch_object(manifest_hash, Algorithm::Sha1).await?.is_found()
        {
            warn!(manifest = manifest_hash, "manifest not found");
            return Ok(Fetched::NotFound);
        }

        let manifest = self.store.read_manifest(manifest_hash)?;
        if !manifest.sha1.eq_ignore_ascii_case(sha1) {
            warn!(manifest = manifest_hash, describes = %manifest.sha1, "manifest describes another object");
            return Ok(Fetched::NotFound);
        }

        for (index, chunk) in manifest.chunks.iter().enumerate() {
            if self.store.contains(&chunk.sha1, Algorithm::Sha1) {
                continue;
            }
            if !self.fetch_object(&chunk.sha1, Algorithm::Sha1).await?.is_found() {
                warn!(hash = sha1, chunk = %chunk.sha1, index, "chunk not found");
                return Ok(Fetched::NotFound);
            }
            debug!(hash = sha1, index, total = manifest.chunks.len(), "chunk fetched");
        }

        let path = self.store.concatenate_chunks(sha1, manifest.chunk_hashes())?;
        Ok(Fetched::Found(path))
    }
}
