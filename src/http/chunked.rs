//! Chunked transfer coding
//!
//! Incremental decoder for `Transfer-Encoding: chunked` response bodies.

use super::{Error, Headers, Result};

/// Longest chunk-size line (size plus extensions) accepted
const MAX_CHUNK_LINE: usize = 1024;

/// Chunked decoder
///
/// Input may arrive in arbitrary pieces; the decoder consumes what it can and
/// reports how many input bytes it used.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: DecoderState,
    chunk_remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DecoderState {
    ChunkSize,
    ChunkData,
    ChunkEnd,
    Trailer,
    Complete,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        ChunkedDecoder {
            state: DecoderState::ChunkSize,
            chunk_remaining: 0,
        }
    }

    /// Decode as much of `input` as possible
    ///
    /// Chunk data is appended to `body`, trailer fields to `trailers`.
    /// Returns `(bytes_consumed, is_complete)`. Unconsumed input must be
    /// presented again, followed by more data.
    pub fn decode(
        &mut self,
        input: &[u8],
        body: &mut Vec<u8>,
        trailers: &mut Headers,
    ) -> Result<(usize, bool)> {
        let mut pos = 0;

        loop {
            match self.state {
                DecoderState::ChunkSize => {
                    let Some(line) = take_line(&input[pos..])? else {
                        break;
                    };
                    pos += line.len() + 2;

                    let line = String::from_utf8_lossy(line);
                    // Chunk extensions follow a semicolon and are ignored
                    let size_str = line.split(';').next().unwrap_or_default().trim();
                    self.chunk_remaining = usize::from_str_radix(size_str, 16)
                        .map_err(|_| Error::InvalidChunkSize(size_str.to_string()))?;

                    self.state = if self.chunk_remaining == 0 {
                        DecoderState::Trailer
                    } else {
                        DecoderState::ChunkData
                    };
                }

                DecoderState::ChunkData => {
                    let available = input.len() - pos;
                    if available == 0 {
                        break;
                    }

                    let n = self.chunk_remaining.min(available);
                    body.extend_from_slice(&input[pos..pos + n]);
                    pos += n;
                    self.chunk_remaining -= n;

                    if self.chunk_remaining == 0 {
                        self.state = DecoderState::ChunkEnd;
                    }
                }

                DecoderState::ChunkEnd => {
                    if input.len() - pos < 2 {
                        break;
                    }
                    if &input[pos..pos + 2] != b"\r\n" {
                        return Err(Error::Parse("Expected CRLF after chunk data".to_string()));
                    }
                    pos += 2;
                    self.state = DecoderState::ChunkSize;
                }

                DecoderState::Trailer => {
                    let Some(line) = take_line(&input[pos..])? else {
                        break;
                    };
                    pos += line.len() + 2;

                    if line.is_empty() {
                        self.state = DecoderState::Complete;
                    } else {
                        let (name, value) =
                            Headers::parse_header_line(&String::from_utf8_lossy(line))?;
                        trailers.insert(name, value)?;
                    }
                }

                DecoderState::Complete => break,
            }
        }

        Ok((pos, self.is_complete()))
    }

    /// Check if the terminating chunk and trailer section were seen
    pub fn is_complete(&self) -> bool {
        self.state == DecoderState::Complete
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the next CRLF in a buffer
pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Return the line (without CRLF) at the start of `buf`, if complete
fn take_line(buf: &[u8]) -> Result<Option<&[u8]>> {
    match find_crlf(buf) {
        Some(end) if end > MAX_CHUNK_LINE => Err(Error::HeaderLimit),
        Some(end) => Ok(Some(&buf[..end])),
        None if buf.len() > MAX_CHUNK_LINE => Err(Error::HeaderLimit),
        None => Ok(None),
    }
}
