use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, PermissionMode, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: PermissionMode,
}

impl AtomicWriteOptions {
    pub fn new() -> Self { Self::default() }

    pub fn permissions(mut self, permissions: PermissionMode) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Outcome of moving a staged file into its final location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Created,
    /// The destination already existed; the staged file was discarded.
    AlreadyPresent,
}

/// Create an anonymous staging file in `dir`. It is deleted on drop unless
/// handed to [`commit_staged`].
pub fn staged_file(dir: impl AsRef<Path>) -> Result<NamedTempFile> {
    let dir = dir.as_ref();
    crate::ensure_dir_all(dir)?;
    tempfile::Builder::new()
        .prefix(".stage-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::Write {
            path:   dir.to_path_buf(),
            source: e,
        })
}

/// Move a staged file to `dest` with a single rename.
///
/// `dest` must be on the same filesystem as the staging file. When `dest`
/// already exists the staged copy is dropped, so a concurrent reader only
/// ever sees a complete file at `dest`.
pub fn commit_staged(
    staged: NamedTempFile,
    dest: impl AsRef<Path>,
    options: AtomicWriteOptions,
) -> Result<Placement> {
    let dest = dest.as_ref();
    if dest.exists() {
        return Ok(Placement::AlreadyPresent);
    }

    options.permissions.apply_to_path(staged.path())?;

    let from = staged.path().to_path_buf();
    staged.persist(dest).map_err(|e| Error::Rename {
        from,
        to: dest.to_path_buf(),
        source: e.error,
    })?;
    Ok(Placement::Created)
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path:   path.to_path_buf(),
        source: e,
    })
}

/// Write helper for callers that already hold a staging file.
pub fn write_all(staged: &mut NamedTempFile, data: &[u8]) -> Result<()> {
    staged.as_file_mut().write_all(data).map_err(|e| Error::Write {
        path:   staged.path().to_path_buf(),
        source: e,
    })
}
