use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Hash algorithms a content-address URI may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Sha1,
    Md5,
    /// Keyed objects. These are addressed by an opaque key, not a digest of
    /// their bytes, so nothing can be verified or committed for them.
    Key,
}

/// Prefix table consulted by [`Algorithm::from_protocol`].
const PROTOCOL_PREFIXES: [(&str, Algorithm); 3] = [
    ("sha1", Algorithm::Sha1),
    ("md5", Algorithm::Md5),
    ("key", Algorithm::Key),
];

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Sha1, Algorithm::Md5, Algorithm::Key];

    /// Classify a URI protocol by prefix, e.g. `sha1-contiguous` is `Sha1`.
    pub fn from_protocol(protocol: &str) -> Option<Self> {
        PROTOCOL_PREFIXES
            .iter()
            .find(|(prefix, _)| protocol.starts_with(prefix))
            .map(|(_, algorithm)| *algorithm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
            Self::Key => "key",
        }
    }

    /// Length of a hex-encoded digest, `None` for non-digest algorithms.
    pub fn hex_len(self) -> Option<usize> {
        match self {
            Self::Sha1 => Some(40),
            Self::Md5 => Some(32),
            Self::Key => None,
        }
    }

    pub fn is_digest(self) -> bool { self.hex_len().is_some() }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROTOCOL_PREFIXES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, algorithm)| *algorithm)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}
