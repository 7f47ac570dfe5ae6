//! HTTP response parsing
//!
//! `ResponseParser` consumes bytes from the front of a persistent read buffer
//! and keeps its state between calls, so a response may arrive in any number
//! of partial reads.

use super::chunked::{find_crlf, ChunkedDecoder};
use super::{
    Error, Headers, Response, Result, Status, Version, MAX_BODY_BYTES, MAX_HEADER_BYTES,
};
use bytes::{Buf, BytesMut};

/// Parse HTTP response status line
///
/// Format: VERSION STATUS [REASON]
/// Example: HTTP/1.1 200 OK
pub fn parse_status_line(line: &str) -> Result<(Version, Status, String)> {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();

    if parts.len() < 2 {
        return Err(Error::Parse(format!(
            "Invalid status line: expected at least 2 parts, got {}",
            parts.len()
        )));
    }

    let version = Version::from_str(parts[0])?;

    if parts[1].len() != 3 || !parts[1].bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidStatus(parts[1].to_string()));
    }
    let status_code = parts[1]
        .parse::<u16>()
        .map_err(|_| Error::InvalidStatus(parts[1].to_string()))?;
    let status = Status::new(status_code)?;

    let reason = match parts.get(2) {
        Some(reason) => reason.to_string(),
        None => status.reason_phrase().to_string(),
    };

    Ok((version, status, reason))
}

/// How the end of the body is determined
#[derive(Debug, Clone, Copy, PartialEq)]
enum Framing {
    Empty,
    Length(usize),
    Chunked,
    UntilClose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    StatusLine,
    Headers,
    Body(Framing),
    Complete,
}

/// HTTP response parser
#[derive(Debug)]
pub struct ResponseParser {
    state: ParserState,
    consumed: usize,
    version: Version,
    status: Status,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
    chunked: ChunkedDecoder,
}

impl ResponseParser {
    pub fn new() -> Self {
        ResponseParser {
            state: ParserState::StatusLine,
            consumed: 0,
            version: Version::default(),
            status: Status::OK,
            reason: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            chunked: ChunkedDecoder::new(),
        }
    }

    /// Parse from the front of `buf`, removing the bytes that were used
    ///
    /// Returns `Ok(true)` once a complete response has been assembled and
    /// `Ok(false)` when more input is needed. Bytes following a complete
    /// response are left in `buf`.
    pub fn parse(&mut self, buf: &mut BytesMut) -> Result<bool> {
        loop {
            match self.state {
                ParserState::StatusLine => {
                    let Some(line) = self.take_line(buf)? else {
                        return Ok(false);
                    };
                    let (version, status, reason) = parse_status_line(&line)?;
                    self.version = version;
                    self.status = status;
                    self.reason = reason;
                    self.state = ParserState::Headers;
                }

                ParserState::Headers => {
                    let Some(line) = self.take_line(buf)? else {
                        return Ok(false);
                    };
                    if line.is_empty() {
                        self.state = ParserState::Body(self.framing()?);
                    } else {
                        let (name, value) = Headers::parse_header_line(&line)?;
                        self.headers
                            .insert(name, value)
                            .map_err(|_| Error::HeaderLimit)?;
                    }
                }

                ParserState::Body(Framing::Empty) | ParserState::Body(Framing::Length(0)) => {
                    self.state = ParserState::Complete;
                }

                ParserState::Body(Framing::Length(remaining)) => {
                    let n = remaining.min(buf.len());
                    self.take_body(buf, n)?;
                    if n < remaining {
                        self.state = ParserState::Body(Framing::Length(remaining - n));
                        return Ok(false);
                    }
                    self.state = ParserState::Complete;
                }

                ParserState::Body(Framing::Chunked) => {
                    let (used, complete) =
                        self.chunked.decode(&buf[..], &mut self.body, &mut self.headers)?;
                    buf.advance(used);
                    self.consumed += used;

                    if self.body.len() > MAX_BODY_BYTES {
                        return Err(Error::BodyLimit);
                    }
                    if !complete {
                        return Ok(false);
                    }
                    self.state = ParserState::Complete;
                }

                ParserState::Body(Framing::UntilClose) => {
                    let n = buf.len();
                    self.take_body(buf, n)?;
                    return Ok(false);
                }

                ParserState::Complete => return Ok(true),
            }
        }
    }

    /// Signal that the stream ended
    ///
    /// A close-delimited body becomes complete. Anything else that is not
    /// already complete was cut short: `ConnectionClosed` when nothing at all
    /// arrived, `Truncated` otherwise. `unparsed` is the number of received
    /// bytes still sitting in the read buffer.
    pub fn finish(&mut self, unparsed: usize) -> Result<()> {
        match self.state {
            ParserState::Complete => Ok(()),
            ParserState::Body(Framing::UntilClose) => {
                self.state = ParserState::Complete;
                Ok(())
            }
            ParserState::StatusLine if self.consumed == 0 && unparsed == 0 => {
                Err(Error::ConnectionClosed)
            }
            _ => Err(Error::Truncated {
                consumed: self.consumed + unparsed,
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParserState::Complete
    }

    /// Number of bytes consumed from the stream so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Take the parsed response; fails unless parsing completed
    pub fn into_response(self) -> Result<Response> {
        if !self.is_complete() {
            return Err(Error::Incomplete);
        }

        Ok(Response::builder()
            .version(self.version)
            .status(self.status)
            .reason(self.reason)
            .headers(self.headers)
            .body(self.body)
            .build())
    }

    /// Take one CRLF-terminated line of the status line or header section
    fn take_line(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        let Some(end) = find_crlf(&buf[..]) else {
            if self.consumed + buf.len() > MAX_HEADER_BYTES {
                return Err(Error::HeaderLimit);
            }
            return Ok(None);
        };

        if self.consumed + end + 2 > MAX_HEADER_BYTES {
            return Err(Error::HeaderLimit);
        }

        let line = String::from_utf8_lossy(&buf[..end]).into_owned();
        buf.advance(end + 2);
        self.consumed += end + 2;
        Ok(Some(line))
    }

    fn take_body(&mut self, buf: &mut BytesMut, n: usize) -> Result<()> {
        if self.body.len() + n > MAX_BODY_BYTES {
            return Err(Error::BodyLimit);
        }

        self.body.extend_from_slice(&buf[..n]);
        buf.advance(n);
        self.consumed += n;
        Ok(())
    }

    /// Decide body framing once the header section is complete (RFC 7230 3.3.3)
    fn framing(&self) -> Result<Framing> {
        if self.status.forbids_body() {
            return Ok(Framing::Empty);
        }

        if let Some(encoding) = self.headers.get("Transfer-Encoding") {
            let last = encoding.rsplit(',').next().unwrap_or_default().trim();
            return Ok(if last.eq_ignore_ascii_case("chunked") {
                Framing::Chunked
            } else {
                Framing::UntilClose
            });
        }

        let lengths = self.headers.get_all("Content-Length");
        let Some(first) = lengths.first() else {
            return Ok(Framing::UntilClose);
        };
        if lengths.iter().any(|l| l != first) {
            return Err(Error::Parse("Conflicting Content-Length fields".to_string()));
        }

        let length = first
            .parse::<usize>()
            .map_err(|_| Error::Parse(format!("Invalid Content-Length: {}", first)))?;
        if length > MAX_BODY_BYTES {
            return Err(Error::BodyLimit);
        }

        Ok(Framing::Length(length))
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
