//! Chunk manifests for large objects.
//!
//! A manifest lists fixed-size byte ranges of a sha1 object together with the
//! sha1 of each range, so the object can be fetched piecewise and reassembled.

use serde::{Deserialize, Serialize};
use stowage_verify::{Hasher, Sha1Hasher};

/// Objects larger than this are described by a manifest.
pub const DEFAULT_CHUNK_SIZE: u64 = 20_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestChunk {
    pub start: u64,
    pub end:   u64,
    pub sha1:  String,
}

impl ManifestChunk {
    pub fn len(&self) -> u64 { self.end - self.start }

    pub fn is_empty(&self) -> bool { self.end == self.start }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub size:   u64,
    pub sha1:   String,
    pub chunks: Vec<ManifestChunk>,
}

impl Manifest {
    pub fn chunk_hashes(&self) -> impl Iterator<Item = &str> { self.chunks.iter().map(|c| c.sha1.as_str()) }

    /// Only multi-chunk objects get a stored manifest.
    pub fn is_chunked(&self) -> bool { self.chunks.len() > 1 }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> { serde_json::to_vec(self) }
}

/// Accumulates per-chunk sha1 digests while an object streams past.
pub struct ManifestBuilder {
    chunk_size: u64,
    hasher:     Sha1Hasher,
    start:      u64,
    filled:     u64,
    chunks:     Vec<ManifestChunk>,
}

impl ManifestBuilder {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            hasher: Sha1Hasher::new(),
            start: 0,
            filled: 0,
            chunks: Vec::new(),
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = (self.chunk_size - self.filled) as usize;
            let take = room.min(data.len());
            let (head, tail) = data.split_at(take);
            self.hasher.update(head);
            self.filled += take as u64;
            data = tail;
            if self.filled == self.chunk_size {
                self.close_chunk();
            }
        }
    }

    fn close_chunk(&mut self) {
        let hasher = std::mem::replace(&mut self.hasher, Sha1Hasher::new());
        let end = self.start + self.filled;
        self.chunks.push(ManifestChunk {
            start: self.start,
            end,
            sha1: hasher.finalize_hex(),
        });
        self.start = end;
        self.filled = 0;
    }

    pub fn finish(mut self, sha1: impl Into<String>) -> Manifest {
        if self.filled > 0 {
            self.close_chunk();
        }
        Manifest {
            size:   self.start,
            sha1:   sha1.into(),
            chunks: self.chunks,
        }
    }
}
