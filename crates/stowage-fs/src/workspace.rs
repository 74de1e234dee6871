use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result, permissions};

/// A scratch directory that is removed when dropped, on every exit path.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("stowage-")
            .tempdir()
            .map_err(|e| Error::CreateDir {
                path:   std::env::temp_dir(),
                source: e,
            })?;
        Ok(Self { dir })
    }

    /// Create a workspace inside `parent`, creating `parent` if needed.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        crate::ensure_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("stowage-")
            .tempdir_in(parent)
            .map_err(|e| Error::CreateDir {
                path:   parent.to_path_buf(),
                source: e,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path { self.dir.path() }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf { self.dir.path().join(name) }

    /// Write `content` to `name` inside the workspace.
    pub fn write(&self, name: impl AsRef<Path>, content: &[u8]) -> Result<PathBuf> {
        let path = self.join(name);
        std::fs::write(&path, content).map_err(|e| Error::Write {
            path:   path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Open the workspace and `file` up to other users, so a storage process
    /// running under another account can read the file.
    pub fn share(&self, file: &Path) -> Result<()> {
        permissions::make_traversable(self.path())?;
        permissions::make_readable(file)
    }
}
