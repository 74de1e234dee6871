//! Filesystem primitives for the content store.
//!
//! Every write that becomes visible to other processes goes through a staging
//! file and a single `rename`, so readers observe either nothing or a
//! complete file. Scratch space is scoped and removed on drop.

mod atomic;
mod dir;
mod error;
mod hardlink;
pub mod permissions;
mod workspace;

pub use atomic::{
    AtomicWriteOptions, Placement, atomic_read, commit_staged, staged_file, write_all,
};
pub use dir::{ensure_dir_all, fresh_size};
pub use error::{Error, Result};
pub use hardlink::{FallbackStrategy, HardlinkOrCopyOptions, LinkOutcome, hardlink_or_copy};
pub use permissions::PermissionMode;
pub use workspace::Workspace;

pub use tempfile::NamedTempFile;
