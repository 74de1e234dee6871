use std::io;
use std::path::Path;

use crate::{Error, Result};

/// Create `path` and its parents. Losing a creation race to another writer
/// is success, not an error.
pub fn ensure_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(Error::CreateDir {
            path:   path.to_path_buf(),
            source: e,
        }),
    }
}

/// Size of `path` as reported by a direct `stat(2)` call.
///
/// Network filesystems may serve cached metadata to higher level APIs; a
/// direct stat asks the kernel each time.
#[cfg(unix)]
pub fn fresh_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    nix::sys::stat::stat(path)
        .map(|st| st.st_size as u64)
        .map_err(|errno| Error::Stat {
            path:   path.to_path_buf(),
            source: io::Error::from(errno),
        })
}

#[cfg(not(unix))]
pub fn fresh_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| Error::Stat {
            path:   path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dir_all_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir_all(&nested).unwrap();
        ensure_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn ensure_dir_all_rejects_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_dir_all(&file).is_err());
    }

    #[test]
    fn concurrent_ensure_dir_all() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("x/y/z");
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| ensure_dir_all(&nested).unwrap());
            }
        });
        assert!(nested.is_dir());
    }

    #[test]
    fn fresh_size_reports_length() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();
        assert_eq!(fresh_size(&file).unwrap(), 5);
        assert!(fresh_size(dir.path().join("missing")).is_err());
    }
}
