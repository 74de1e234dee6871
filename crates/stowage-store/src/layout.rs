use std::path::{Path, PathBuf};

use stowage_uri::Algorithm;

use crate::{Error, Result};

/// Number of nested shard directories.
pub const SHARD_DEPTH: usize = 3;
/// Hex characters per shard directory name.
pub const SHARD_WIDTH: usize = 2;

/// `<root>/<algorithm>/<h0h1>/<h2h3>/<h4h5>/<hash>`
pub fn object_path(root: &Path, algorithm: Algorithm, hash: &str) -> Result<PathBuf> {
    validate_hash(algorithm, hash)?;

    let mut path = root.join(algorithm.as_str());
    for depth in 0..SHARD_DEPTH {
        let start = depth * SHARD_WIDTH;
        path.push(&hash[start..start + SHARD_WIDTH]);
    }
    path.push(hash);
    Ok(path)
}

fn validate_hash(algorithm: Algorithm, hash: &str) -> Result<()> {
    let well_formed = hash.len() >= SHARD_DEPTH * SHARD_WIDTH
        && algorithm.hex_len().is_none_or(|len| hash.len() == len)
        && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidHash {
            algorithm,
            hash: hash.to_string(),
        })
    }
}
