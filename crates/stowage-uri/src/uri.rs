use std::fmt;
use std::str::FromStr;

use crate::{Algorithm, Error, Result};

/// A parsed content-address URI. Immutable once built.
///
/// Everything after the hash segment is kept as one relative path. Its last
/// segment is the [`basename`](Self::basename) (a display name hint) and the
/// segments before it form the [`subpath`](Self::subpath).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentUri {
    protocol:  String,
    algorithm: Algorithm,
    hash:      String,
    extension: Option<String>,
    path:      String,
    manifest:  Option<String>,
}

impl ContentUri {
    /// Build a URI whose protocol is the algorithm name.
    pub fn new(algorithm: Algorithm, hash: impl Into<String>) -> Self {
        Self {
            protocol: algorithm.as_str().to_string(),
            algorithm,
            hash: normalize_hash(algorithm, hash.into()),
            extension: None,
            path: String::new(),
            manifest: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason| Error::Malformed {
            uri: input.to_string(),
            reason,
        };

        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (input, None),
        };

        let mut segments = path.split('/');
        let head = segments.next().unwrap_or_default();
        let protocol = head.strip_suffix(':').unwrap_or(head);
        let algorithm = Algorithm::from_protocol(protocol)
            .ok_or_else(|| malformed("no recognized algorithm prefix"))?;

        // the empty segment between the two slashes of `://`
        segments.next();

        let hash_segment = segments.next().unwrap_or_default();
        let (hash, extension) = match hash_segment.split_once('.') {
            Some((hash, ext)) => (hash, Some(ext).filter(|e| !e.is_empty())),
            None => (hash_segment, None),
        };
        if hash.is_empty() {
            return Err(malformed("empty hash segment"));
        }

        let path = segments
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        let manifest = query
            .and_then(|q| q.split('&').find_map(|pair| pair.strip_prefix("manifest=")))
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_lowercase);

        Ok(Self {
            protocol: protocol.to_string(),
            algorithm,
            hash: normalize_hash(algorithm, hash.to_string()),
            extension: extension.map(str::to_string),
            path,
            manifest,
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into()).filter(|e| !e.is_empty());
        self
    }

    /// Replace the basename, keeping any subpath in front of it.
    pub fn with_basename(mut self, basename: impl AsRef<str>) -> Self {
        let basename = basename.as_ref().trim_matches('/');
        let subpath = self.subpath();
        self.path = match (subpath.is_empty(), basename.is_empty()) {
            (_, true) => subpath.to_string(),
            (true, false) => basename.to_string(),
            (false, false) => format!("{subpath}/{basename}"),
        };
        self
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into()).filter(|m| !m.is_empty());
        self
    }

    pub fn protocol(&self) -> &str { &self.protocol }

    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    pub fn hash(&self) -> &str { &self.hash }

    pub fn extension(&self) -> Option<&str> { self.extension.as_deref() }

    /// Segments between the hash and the basename, empty when there are none.
    pub fn subpath(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    pub fn basename(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next().unwrap_or_default();
        (!name.is_empty()).then_some(name)
    }

    pub fn manifest(&self) -> Option<&str> { self.manifest.as_deref() }

    /// Name to give the content when materialised: the basename if present,
    /// otherwise the hash with its extension.
    pub fn display_name(&self) -> String {
        match (self.basename(), &self.extension) {
            (Some(name), _) => name.to_string(),
            (None, Some(ext)) => format!("{}.{}", self.hash, ext),
            (None, None) => self.hash.clone(),
        }
    }

    /// The same object without path, extension or manifest decoration.
    pub fn bare(&self) -> Self { Self::new(self.algorithm, self.hash.clone()) }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.hash)?;
        if let Some(ext) = &self.extension {
            write!(f, ".{ext}")?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        if let Some(manifest) = &self.manifest {
            write!(f, "?manifest={manifest}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

/// Hex digests are compared and stored in lower case; key names keep theirs.
fn normalize_hash(algorithm: Algorithm, mut hash: String) -> String {
    if algorithm.is_digest() {
        hash.make_ascii_lowercase();
    }
    hash
}
