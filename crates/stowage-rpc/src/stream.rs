use std::marker::PhantomData;

use bytes::Bytes;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::client::{BoxStream, HttpClient};
use crate::frame::FrameDecoder;
use crate::Result;

/// Pull-based cursor over a framed response body.
///
/// Each call to [`MessageStream::next`] yields the next decoded message in
/// arrival order, or `None` once the body ends cleanly on a frame boundary.
/// Dropping the cursor closes the underlying connection.
pub struct MessageStream<T = Value> {
    body:    BoxStream<'static, Result<Bytes>>,
    decoder: FrameDecoder,
    done:    bool,
    decoded: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> MessageStream<T> {
    pub fn new(body: BoxStream<'static, Result<Bytes>>) -> Self {
        Self {
            body,
            decoder: FrameDecoder::new(),
            done: false,
            decoded: 0,
            _marker: PhantomData,
        }
    }

    /// POST `payload` to `path` and frame the response body.
    ///
    /// A non-success status is reported as `RequestFailed` here, before any
    /// frame is read.
    pub async fn open<C: HttpClient>(client: &C, path: &str, payload: &Value) -> Result<Self> {
        debug!(path, "opening message stream");
        let body = client.post_stream(path, payload).await?;
        Ok(Self::new(body))
    }

    pub async fn next(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                self.decoded += 1;
                trace!(len = frame.len(), index = self.decoded, "decoded frame");
                return Ok(Some(serde_json::from_slice(&frame)?));
            }
            if self.done {
                return Ok(None);
            }
            match self.body.next().await {
                Some(chunk) => self.decoder.push(&chunk?),
                None => {
                    self.done = true;
                    self.decoder.finish()?;
                    debug!(frames = self.decoded, "message stream ended");
                    return Ok(None);
                }
            }
        }
    }

    /// Number of messages decoded so far.
    pub fn decoded(&self) -> usize { self.decoded }
}
