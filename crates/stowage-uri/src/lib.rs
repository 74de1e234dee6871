//! Content-address URIs.
//!
//! A content-address URI names a file by the digest of its bytes:
//!
//! ```text
//! <algorithm>://<hash>[.<ext>][/<subpath>][/<basename>][?manifest=<hash>]
//! ```
//!
//! The protocol only has to *start with* a supported algorithm name, so
//! `sha1://` and `sha1dir://` both classify as [`Algorithm::Sha1`].
//!
//! # Example
//!
//! ```
//! use stowage_uri::{Algorithm, ContentUri};
//!
//! let uri: ContentUri = "sha1://0a0a9f2a6772942557ab5355d76af442f8f65e01/hello.txt"
//!     .parse()
//!     .unwrap();
//! assert_eq!(uri.algorithm(), Algorithm::Sha1);
//! assert_eq!(uri.basename(), Some("hello.txt"));
//! ```

pub use self::algorithm::Algorithm;
pub use self::error::{Error, Result};
pub use self::uri::ContentUri;

mod algorithm;
mod error;
mod uri;
