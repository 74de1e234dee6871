//! Load, find and store content-addressed files.
//!
//! Files are named by URIs such as
//! `sha1://aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d/file.txt`. A local daemon
//! knows which peers hold which hashes; [`Stowage`] asks it for candidates,
//! downloads and verifies them, and keeps verified copies in a sharded local
//! store. With `offline = true` only the local store is used.
//!
//! ```no_run
//! use stowage::{Config, Stowage};
//!
//! # async fn run() -> stowage::Result<()> {
//! let client = Stowage::new(&Config::default())?;
//! let uri = client.store_text("hello", None).await?;
//! assert_eq!(client.load_text(&uri).await?.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod facade;

pub use client::{GET_STATE_PATH, JOIN_SWARM_PATH, LEAVE_SWARM_PATH, Stowage};
pub use config::{Config, Connectivity, DEFAULT_DAEMON_URL};
pub use error::{Error, Result};
pub use facade::{STORE_PATH, StoreFacade};

pub use stowage_fetch::{CandidateLocation, Fetched};
pub use stowage_uri::{Algorithm, ContentUri};
