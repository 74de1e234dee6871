use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use stowage_fs::{
    AtomicWriteOptions, FallbackStrategy, HardlinkOrCopyOptions, NamedTempFile, PermissionMode,
    Placement,
};
use stowage_uri::Algorithm;
use stowage_verify::{AnyHasher, VerifiedReader};
use tracing::{debug, info};

use crate::layout::object_path;
use crate::manifest::{DEFAULT_CHUNK_SIZE, Manifest, ManifestBuilder};
use crate::{Error, Result};

const COPY_BUFFER: usize = 64 * 1024;
const STAGING_DIR: &str = "tmp";

#[derive(Clone, Copy, Debug)]
pub struct StoreOptions {
    /// Hard-link committed files into the store instead of copying them.
    /// Only safe when callers never modify a file after committing it.
    pub use_hard_links: bool,

    /// Objects spanning more than one chunk of this size get a manifest.
    pub chunk_size: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            use_hard_links: false,
            chunk_size:     DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self { Self::default() }

    pub fn use_hard_links(mut self, enabled: bool) -> Self {
        self.use_hard_links = enabled;
        self
    }

    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Result of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub hash:      String,
    pub manifest:  Option<String>,
    pub path:      PathBuf,
    pub size:      u64,
    pub placement: Placement,
}

/// Content-addressed object store rooted at a local directory.
///
/// The store is the only writer of object paths. Every object becomes visible
/// through a single rename or link, so concurrent committers of the same bytes
/// and concurrent readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct Store {
    root:    PathBuf,
    options: StoreOptions,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        stowage_fs::ensure_dir_all(&root)?;
        Ok(Self {
            root,
            options: StoreOptions::default(),
        })
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn options(&self) -> StoreOptions { self.options }

    /// Deterministic location of an object. With `create`, parent shard
    /// directories are created as well.
    pub fn path_for(&self, hash: &str, algorithm: Algorithm, create: bool) -> Result<PathBuf> {
        let path = object_path(&self.root, algorithm, hash)?;
        if create && let Some(parent) = path.parent() {
            stowage_fs::ensure_dir_all(parent)?;
        }
        Ok(path)
    }

    pub fn locate(&self, hash: &str, algorithm: Algorithm) -> Option<PathBuf> {
        self.path_for(hash, algorithm, false)
            .ok()
            .filter(|path| path.is_file())
    }

    pub fn contains(&self, hash: &str, algorithm: Algorithm) -> bool {
        self.locate(hash, algorithm).is_some()
    }

    pub fn size_of(&self, hash: &str, algorithm: Algorithm) -> Option<u64> {
        self.locate(hash, algorithm)
            .and_then(|path| std::fs::metadata(path).ok())
            .map(|meta| meta.len())
    }

    /// Commit the file at `source`, returning its hash and, for large sha1
    /// objects, the hash of the manifest stored alongside it.
    pub fn commit(&self, source: &Path, algorithm: Algorithm) -> Result<Committed> {
        ensure_committable(algorithm)?;
        if self.options.use_hard_links {
            return self.commit_linked(source, algorithm);
        }
        let file = File::open(source).map_err(|e| Error::Io {
            path:   source.to_path_buf(),
            source: e,
        })?;
        self.commit_reader(file, algorithm)
    }

    /// Commit whatever `reader` yields. The bytes are copied into a staging
    /// file under the store root while being digested.
    pub fn commit_reader<R: Read>(&self, mut reader: R, algorithm: Algorithm) -> Result<Committed> {
        ensure_committable(algorithm)?;
        let mut staged = stowage_fs::staged_file(self.staging_dir())?;
        let digest = self.digest_stream(&mut reader, algorithm, Some(&mut staged))?;
        let path = self.path_for(&digest.hash, algorithm, true)?;
        let placement = stowage_fs::commit_staged(staged, &path, object_write_options())?;
        self.finish_commit(digest, path, placement)
    }

    pub fn commit_bytes(&self, data: &[u8], algorithm: Algorithm) -> Result<Committed> {
        self.commit_reader(data, algorithm)
    }

    fn commit_linked(&self, source: &Path, algorithm: Algorithm) -> Result<Committed> {
        let file = File::open(source).map_err(|e| Error::Io {
            path:   source.to_path_buf(),
            source: e,
        })?;
        let digest = self.digest_stream(file, algorithm, None)?;
        let path = self.path_for(&digest.hash, algorithm, true)?;
        if path.exists() {
            return self.finish_commit(digest, path, Placement::AlreadyPresent);
        }

        let options = HardlinkOrCopyOptions::new().fallback(FallbackStrategy::Error);
        let placement = match stowage_fs::hardlink_or_copy(source, &path, options) {
            Ok(_) => {
                stowage_fs::permissions::make_readable(&path)?;
                Placement::Created
            }
            Err(stowage_fs::Error::Write { source: e, .. }) if e.kind() == io::ErrorKind::AlreadyExists => {
                Placement::AlreadyPresent
            }
            Err(stowage_fs::Error::CrossDeviceHardlink) => {
                debug!(source = %source.display(), "hard link crosses filesystems, copying");
                let file = File::open(source).map_err(|e| Error::Io {
                    path:   source.to_path_buf(),
                    source: e,
                })?;
                let mut staged = stowage_fs::staged_file(self.staging_dir())?;
                let mut verified = VerifiedReader::new(file, AnyHasher::for_algorithm(algorithm)?);
                copy_into(&mut verified, None, Some(&mut staged))?;
                verified.finish(&digest.hash)?;
                stowage_fs::commit_staged(staged, &path, object_write_options())?
            }
            Err(e) => return Err(e.into()),
        };
        self.finish_commit(digest, path, placement)
    }

    fn finish_commit(&self, digest: Digest, path: PathBuf, placement: Placement) -> Result<Committed> {
        let manifest = match digest.manifest {
            Some(manifest) if manifest.is_chunked() => {
                let stored = self.commit_reader(&manifest.to_json()?[..], Algorithm::Sha1)?;
                Some(stored.hash)
            }
            _ => None,
        };

        match placement {
            Placement::Created => info!(hash = %digest.hash, size = digest.size, "committed object"),
            Placement::AlreadyPresent => debug!(hash = %digest.hash, "object already stored"),
        }

        Ok(Committed {
            hash: digest.hash,
            manifest,
            path,
            size: digest.size,
            placement,
        })
    }

    /// Load and parse a stored manifest.
    pub fn read_manifest(&self, hash: &str) -> Result<Manifest> {
        let path = self.locate(hash, Algorithm::Sha1).ok_or_else(|| Error::NotFound {
            algorithm: Algorithm::Sha1,
            hash:      hash.to_string(),
        })?;
        let bytes = stowage_fs::atomic_read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Rebuild the sha1 object `sha1` from stored chunks, verifying the
    /// concatenation before it becomes visible.
    pub fn concatenate_chunks<'a>(
        &self,
        sha1: &str,
        chunk_hashes: impl IntoIterator<Item = &'a str>,
    ) -> Result<PathBuf> {
        let target = self.path_for(sha1, Algorithm::Sha1, false)?;
        if target.is_file() {
            return Ok(target);
        }

        let chunk_paths = chunk_hashes
            .into_iter()
            .map(|chunk| {
                self.locate(chunk, Algorithm::Sha1)
                    .ok_or_else(|| Error::MissingChunk(chunk.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut chained: Box<dyn Read> = Box::new(io::empty());
        for chunk_path in &chunk_paths {
            let file = File::open(chunk_path).map_err(|e| Error::Io {
                path:   chunk_path.clone(),
                source: e,
            })?;
            chained = Box::new(chained.chain(file));
        }

        let mut staged = stowage_fs::staged_file(self.staging_dir())?;
        let mut verified = VerifiedReader::new(chained, AnyHasher::for_algorithm(Algorithm::Sha1)?);
        copy_into(&mut verified, None, Some(&mut staged))?;
        verified.finish(sha1)?;

        let target = self.path_for(sha1, Algorithm::Sha1, true)?;
        stowage_fs::commit_staged(staged, &target, object_write_options())?;
        info!(hash = %sha1, chunks = chunk_paths.len(), "reassembled object from chunks");
        Ok(target)
    }

    /// Directory for staging files; on the same filesystem as the objects.
    pub fn staging_dir(&self) -> PathBuf { self.root.join(STAGING_DIR) }

    fn digest_stream<R: Read>(
        &self,
        reader: R,
        algorithm: Algorithm,
        sink: Option<&mut NamedTempFile>,
    ) -> Result<Digest> {
        let mut verified = VerifiedReader::new(reader, AnyHasher::for_algorithm(algorithm)?);
        let mut manifest =
            (algorithm == Algorithm::Sha1).then(|| ManifestBuilder::new(self.options.chunk_size));
        copy_into(&mut verified, manifest.as_mut(), sink)?;
        let size = verified.bytes_read();
        let hash = verified.digest();
        let manifest = manifest.map(|builder| builder.finish(hash.clone()));
        Ok(Digest {
            hash,
            size,
            manifest,
        })
    }
}

struct Digest {
    hash:     String,
    size:     u64,
    manifest: Option<Manifest>,
}

fn ensure_committable(algorithm: Algorithm) -> Result<()> {
    if algorithm.is_digest() {
        Ok(())
    } else {
        Err(Error::UnsupportedAlgorithm(algorithm))
    }
}

fn object_write_options() -> AtomicWriteOptions {
    AtomicWriteOptions::new().permissions(PermissionMode::ReadOnly)
}

/// Drain `reader` into the optional manifest builder and staging file.
fn copy_into<R: Read>(
    reader: &mut R,
    mut manifest: Option<&mut ManifestBuilder>,
    mut sink: Option<&mut NamedTempFile>,
) -> Result<()> {
    let mut buf = vec![0u8; COPY_BUFFER];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(stowage_verify::Error::Io(e).into()),
        };
        let chunk = &buf[..n];
        if let Some(builder) = manifest.as_deref_mut() {
            builder.update(chunk);
        }
        if let Some(staged) = sink.as_deref_mut() {
            stowage_fs::write_all(staged, chunk)?;
        }
    }
}
