use std::path::Path;

use crate::{Error, Result};

/// Permission bits for owner, group and other read.
pub const READ_ALL: u32 = 0o444;
/// Permission bits for owner, group and other execute.
pub const EXEC_ALL: u32 = 0o111;

/// File permission modes applied when placing files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the process umask produced.
    #[default]
    Inherit,

    /// `0o444`. Stored objects are immutable once committed.
    ReadOnly,
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::ReadOnly => Some(READ_ALL),
        }
    }

    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        let Some(mode) = self.to_unix_mode() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
                Error::Write {
                    path:   path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        #[cfg(not(unix))]
        {
            let mut perms = std::fs::metadata(path)
                .map_err(|e| Error::Stat {
                    path:   path.to_path_buf(),
                    source: e,
                })?
                .permissions();
            perms.set_readonly(mode & 0o222 == 0);
            std::fs::set_permissions(path, perms).map_err(|e| Error::Write {
                path:   path.to_path_buf(),
                source: e,
            })?;
        }

        Ok(())
    }
}

/// Add permission bits to whatever `path` already has.
#[cfg(unix)]
pub fn widen(path: &Path, bits: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let current = std::fs::metadata(path)
        .map_err(|e| Error::Stat {
            path:   path.to_path_buf(),
            source: e,
        })?
        .permissions()
        .mode();
    if current & bits == bits {
        return Ok(());
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(current | bits)).map_err(|e| {
        Error::Write {
            path:   path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
pub fn widen(_path: &Path, _bits: u32) -> Result<()> { Ok(()) }

/// Let other users read a file.
pub fn make_readable(path: &Path) -> Result<()> { widen(path, READ_ALL) }

/// Let other users list and enter a directory.
pub fn make_traversable(path: &Path) -> Result<()> { widen(path, READ_ALL | EXEC_ALL) }
