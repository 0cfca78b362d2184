//! # Frame Decoder
//!
//! Incremental, line-oriented decoder for `data:` frames. Bytes are buffered
//! until a `\n` arrives, so frames and multi-byte UTF-8 sequences split
//! across reads are reassembled before decoding. Used both for upstream
//! provider streams and for the gateway's own outbound stream.

use thiserror::Error;

/// Largest unterminated line the decoder will hold (1MB)
pub const MAX_LINE_BYTES: usize = 1_048_576;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("frame exceeds {limit} bytes without a line terminator")]
pub struct FrameOverflow {
    pub limit: usize,
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the `data:` values of every line it
    /// completed, in order. Non-data lines (blank separators, `event:`,
    /// `id:`, comments) are dropped.
    ///
    /// Lines completed by the chunk are always returned; the overflow, if
    /// any, refers to the unterminated remainder, which is discarded.
    pub fn push(&mut self, chunk: &[u8]) -> (Vec<String>, Option<FrameOverflow>) {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(data) = data_field(&self.buffer[start..end]) {
                payloads.push(data);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            return (payloads, Some(FrameOverflow { limit: MAX_LINE_BYTES }));
        }

        (payloads, None)
    }

    /// Flush the remainder once the byte stream has ended. An unterminated
    /// final `data:` line still counts as a frame.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_field(&rest)
    }

    /// Bytes held back waiting for a line terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn data_field(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let value = line.strip_prefix(b"data:")?;
    let value = value.strip_prefix(b" ").unwrap_or(value);
    Some(String::from_utf8_lossy(value).into_owned())
}
