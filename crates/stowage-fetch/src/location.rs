use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stowage_uri::Algorithm;

use crate::{Error, Result};

/// Lookup key understood by the daemon, e.g. `{"sha1": "<hash>"}`.
///
/// Fields the client does not interpret are kept so the key can be echoed
/// back verbatim in download requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileKey {
    pub fn new(algorithm: Algorithm, hash: impl Into<String>) -> Result<Self> {
        let hash = Some(hash.into());
        match algorithm {
            Algorithm::Sha1 => Ok(Self {
                sha1: hash,
                ..Self::default()
            }),
            Algorithm::Md5 => Ok(Self {
                md5: hash,
                ..Self::default()
            }),
            Algorithm::Key => Err(Error::UnsupportedAlgorithm(algorithm)),
        }
    }

    pub fn hash(&self, algorithm: Algorithm) -> Option<&str> {
        match algorithm {
            Algorithm::Sha1 => self.sha1.as_deref(),
            Algorithm::Md5 => self.md5.as_deref(),
            Algorithm::Key => None,
        }
    }
}

/// One peer offered by the daemon as a possible source. Untrusted until its
/// content has been verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLocation {
    pub primary_node_id: String,
    pub swarm_name:      String,
    pub file_key:        FileKey,
    #[serde(default)]
    pub file_info:       Value,
}

impl CandidateLocation {
    /// Body of the download request for this candidate.
    pub fn download_request(&self) -> Value {
        serde_json::json!({
            "primaryNodeId": self.primary_node_id,
            "swarmName": self.swarm_name,
            "fileKey": self.file_key,
        })
    }
}
