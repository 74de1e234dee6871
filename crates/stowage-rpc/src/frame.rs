//! `<decimal length>#<payload>` frames.

use bytes::{Buf, Bytes, BytesMut};

use crate::{Error, Result};

const MARKER: u8 = b'#';
/// Longer prefixes cannot describe a frame that fits in memory.
const MAX_PREFIX_DIGITS: usize = 19;

/// Incremental frame decoder.
///
/// Bytes are pushed as they arrive; complete frames are popped in arrival
/// order. [`FrameDecoder::finish`] must be called once the byte stream ends to
/// detect a truncated trailing frame.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf:     BytesMut,
    pending: Option<usize>,
}

impl FrameDecoder {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, data: &[u8]) { self.buf.extend_from_slice(data); }

    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let len = match self.pending {
            Some(len) => len,
            None => match self.read_prefix()? {
                Some(len) => len,
                None => return Ok(None),
            },
        };

        if self.buf.len() < len {
            self.pending = Some(len);
            return Ok(None);
        }
        self.pending = None;
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    fn read_prefix(&mut self) -> Result<Option<usize>> {
        let mut len = 0usize;
        let mut marker = None;
        for (idx, &byte) in self.buf.iter().enumerate() {
            if byte == MARKER {
                marker = Some(idx);
                break;
            }
            if !byte.is_ascii_digit() {
                return Err(Error::Framing(format!(
                    "unexpected byte 0x{byte:02x} in length prefix"
                )));
            }
            if idx >= MAX_PREFIX_DIGITS {
                return Err(Error::Framing("length prefix too long".into()));
            }
            len = len * 10 + usize::from(byte - b'0');
        }

        match marker {
            None => Ok(None),
            Some(0) => Err(Error::Framing("empty length prefix".into())),
            Some(idx) => {
                self.buf.advance(idx + 1);
                Ok(Some(len))
            }
        }
    }

    /// Check that the stream ended on a frame boundary.
    pub fn finish(&self) -> Result<()> {
        match self.pending {
            Some(len) => Err(Error::Framing(format!(
                "stream closed after {} of {len} declared bytes",
                self.buf.len()
            ))),
            None if !self.buf.is_empty() => {
                Err(Error::Framing("stream closed inside a length prefix".into()))
            }
            None => Ok(()),
        }
    }
}

/// Encode one frame. Used by tests and in-process daemons.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(payload.len() + 8);
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.extend_from_slice(&[MARKER]);
    out.extend_from_slice(payload);
    out.freeze()
}
