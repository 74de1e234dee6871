//! Streaming RPC against the daemon's HTTP API.
//!
//! Some endpoints answer with an open-ended sequence of JSON messages on a
//! single response body. Each message is framed as `<decimal length>#<json>`
//! with nothing between frames. [`MessageStream`] turns such a body into a
//! pull-based cursor; [`FrameDecoder`] is the underlying pure decoder.

mod client;
mod error;
mod frame;
mod stream;

pub use client::{BoxStream, HttpClient};
#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;
pub use error::{BoxError, Error, Result};
pub use frame::{FrameDecoder, encode_frame};
pub use stream::MessageStream;
