use std::io;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackStrategy {
    #[default]
    Copy,
    Error,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HardlinkOrCopyOptions {
    pub fallback: FallbackStrategy,
}

impl HardlinkOrCopyOptions {
    pub fn new() -> Self { Self::default() }

    pub fn fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }
}

/// How [`hardlink_or_copy`] materialised the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    Copied,
}

/// Hard-link `src` to `dest`, copying instead when they sit on different
/// filesystems and the fallback allows it. `dest` must not exist.
pub fn hardlink_or_copy(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: HardlinkOrCopyOptions,
) -> Result<LinkOutcome> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    let err = match std::fs::hard_link(src, dest) {
        Ok(()) => return Ok(LinkOutcome::Linked),
        Err(e) => e,
    };
    if !crosses_devices(&err) {
        return Err(Error::Write {
            path:   dest.to_path_buf(),
            source: err,
        });
    }

    match options.fallback {
        FallbackStrategy::Copy => std::fs::copy(src, dest)
            .map(|_| LinkOutcome::Copied)
            .map_err(|e| Error::Write {
                path:   dest.to_path_buf(),
                source: e,
            }),
        FallbackStrategy::Error => Err(Error::CrossDeviceHardlink),
    }
}

/// `EXDEV`; older kernels and some network filesystems report only the raw code.
fn crosses_devices(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || err.raw_os_error() == Some(18)
}
