//! Resolve content hashes through the daemon and fetch verified copies.
//!
//! [`Resolver`] streams candidate locations for a hash. [`FetchPipeline`]
//! downloads each candidate in turn, verifies its digest against the
//! requested hash, and commits the first match into the local
//! [`Store`](stowage_store::Store).

mod error;
mod location;
mod pipeline;
mod resolver;

pub use error::{Error, Result};
pub use location::{CandidateLocation, FileKey};
pub use pipeline::{DOWNLOAD_FILE_PATH, FetchOptions, FetchPipeline, Fetched};
pub use resolver::{FIND_FILE_PATH, Resolver};
