//! Line framing codec for tokio.
//!
//! Decodes newline-terminated lines out of the receive stream and frames
//! outgoing lines with CRLF. Extraction rule: the first `"\r\n"` in the
//! buffer wins; failing that, the first bare `"\n"`; otherwise no line is
//! ready. The terminator is consumed along with the line.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Default maximum line length (IRC standard).
pub const DEFAULT_MAX_LINE_LEN: usize = 512;

/// Line-based codec handling both CRLF and bare-LF terminated input.
#[derive(Debug)]
pub struct LineCodec {
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the default 512-byte line limit.
    pub fn new() -> Self {
        Self {
            max_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self { max_len }
    }

    fn take_line(&self, src: &mut BytesMut, end: usize, term_len: usize) -> Result<String, ProtocolError> {
        let line = src.split_to(end);
        src.advance(term_len);
        match std::str::from_utf8(&line) {
            Ok(s) => Ok(s.to_string()),
            Err(e) => Err(ProtocolError::InvalidUtf8 {
                byte_pos: e.valid_up_to(),
            }),
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        if let Some(pos) = src.windows(2).position(|w| w == b"\r\n") {
            if pos > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: pos,
                    limit: self.max_len,
                });
            }
            return self.take_line(src, pos, 2).map(Some);
        }
        if let Some(pos) = src.iter().position(|&b| b == b'\n') {
            if pos > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: pos,
                    limit: self.max_len,
                });
            }
            return self.take_line(src, pos, 1).map(Some);
        }
        // No terminator yet. A buffer past the limit can never become a
        // valid line, so fail now instead of buffering without bound.
        if src.len() > self.max_len {
            return Err(ProtocolError::LineTooLong {
                actual: src.len(),
                limit: self.max_len,
            });
        }
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
