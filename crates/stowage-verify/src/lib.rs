//! Content verification primitives for content-addressed objects.
//!
//! Provides incremental hashing so bytes are digested while they move
//! (downloaded, copied into the store) rather than in a second pass.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use stowage_uri::Algorithm;
//! use stowage_verify::{AnyHasher, VerifiedReader};
//!
//! let data = b"hello";
//! let hasher = AnyHasher::for_algorithm(Algorithm::Sha1).unwrap();
//! let mut reader = VerifiedReader::new(&data[..], hasher);
//! let mut sink = Vec::new();
//! reader.read_to_end(&mut sink).unwrap();
//!
//! reader.finish("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d").unwrap();
//! ```

pub use self::error::{Error, Result};
pub use self::hasher::{AnyHasher, DigestHasher, Hasher, Sha1Hasher};
pub use self::reader::VerifiedReader;

#[cfg(feature = "md5")]
pub use self::hasher::Md5Hasher;

mod error;
mod hasher;
mod reader;
