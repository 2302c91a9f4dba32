//! Line framing with a bounded buffer.
//!
//! Chunks append to the buffer; every complete line is handed to the caller
//! with the newline (and one trailing carriage return) removed. A residual
//! fragment longer than `MAX_BUFFER` terminates the connection.

use bytes::BytesMut;

/// Ceiling on bytes held for an unterminated line.
pub const MAX_BUFFER: usize = 8096;

#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data` and dispatch every complete line. Returns `false` when
    /// the leftover fragment exceeds `MAX_BUFFER` and the connection must
    /// close.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(&str)) -> bool {
        self.buf.extend_from_slice(data);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            let mut line = &line[..line.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            on_line(&String::from_utf8_lossy(line));
        }
        self.buf.len() <= MAX_BUFFER
    }

    /// Bytes currently held for an unterminated line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
