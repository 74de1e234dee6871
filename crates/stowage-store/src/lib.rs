//! Local content-addressed object store.
//!
//! Objects live at `<root>/<algorithm>/<h0h1>/<h2h3>/<h4h5>/<hash>` and are
//! written once through a staging file under `<root>/tmp`. Large sha1 objects
//! get a [`Manifest`] describing fixed-size chunks, itself stored as an object.
//!
//! ```no_run
//! use stowage_store::Store;
//! use stowage_uri::Algorithm;
//!
//! # fn main() -> stowage_store::Result<()> {
//! let store = Store::open("/tmp/stowage")?;
//! let committed = store.commit_bytes(b"hello", Algorithm::Sha1)?;
//! assert!(store.contains(&committed.hash, Algorithm::Sha1));
//! # Ok(())
//! # }
//! ```

mod error;
mod layout;
mod manifest;
mod store;

pub use error::{Error, Result};
pub use layout::{SHARD_DEPTH, SHARD_WIDTH, object_path};
pub use manifest::{DEFAULT_CHUNK_SIZE, Manifest, ManifestBuilder, ManifestChunk};
pub use store::{Committed, Store, StoreOptions};

pub use stowage_fs::Placement;
