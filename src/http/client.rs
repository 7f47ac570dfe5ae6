//! HTTP client implementation
//!
//! `HttpClient` performs one strictly sequential exchange over an established
//! session: the request is written in full, then a single response is read.

use super::{Error, Request, Response, ResponseParser, Result, SessionOps};
use bytes::BytesMut;

/// Size of each read from the session
const READ_CHUNK: usize = 4096;

/// A parsed response together with the number of stream bytes it used
#[derive(Debug)]
pub struct ReceivedResponse {
    pub response: Response,
    pub consumed: usize,
}

/// HTTP client
///
/// The read buffer persists across partial reads until one response has been
/// assembled.
pub struct HttpClient<S: SessionOps> {
    session: S,
    buffer: BytesMut,
}

impl<S: SessionOps> HttpClient<S> {
    /// Create a new HTTP client over an established session
    pub fn new(session: S) -> Self {
        HttpClient {
            session,
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Send an HTTP request
    ///
    /// The encoded request is handed to the session in one call. A write
    /// failure is final.
    pub fn send_request(&mut self, request: &Request) -> Result<()> {
        let wire = request.to_wire();
        tracing::debug!(
            target = request.target(),
            version = %request.version(),
            bytes = wire.len(),
            "sending request"
        );
        self.session.write_all(&wire)
    }

    /// Receive one HTTP response
    ///
    /// End of stream ends the read phase without being an error by itself:
    /// the parser decides whether what arrived is a whole response. Any other
    /// read failure aborts the exchange.
    pub fn receive_response(&mut self) -> Result<ReceivedResponse> {
        let mut parser = ResponseParser::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if parser.parse(&mut self.buffer)? {
                break;
            }

            match self.session.read(&mut chunk) {
                Ok(0) | Err(Error::EndOfStream) => {
                    tracing::debug!(
                        consumed = parser.consumed(),
                        buffered = self.buffer.len(),
                        "end of stream during read"
                    );
                    parser.finish(self.buffer.len())?;
                    break;
                }
                Ok(n) => {
                    tracing::trace!(bytes = n, "read");
                    self.buffer.extend_from_slice(&chunk[..n]);
                }
                Err(e) => return Err(e),
            }
        }

        if !self.buffer.is_empty() {
            tracing::debug!(bytes = self.buffer.len(), "ignoring bytes after response");
        }

        let consumed = parser.consumed();
        Ok(ReceivedResponse {
            response: parser.into_response()?,
            consumed,
        })
    }

    /// Give the session back, e.g. to shut it down
    pub fn into_inner(self) -> S {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::session::mock::{Call, ScriptedSession, Step};
    use crate::http::Version;
    use std::io;

    const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";

    fn request() -> Request {
        Request::get("/")
            .header("Host", "example.com")
            .build()
            .unwrap()
    }

    #[test]
    fn test_send_request_single_write() {
        let mut client = HttpClient::new(ScriptedSession::new([]));
        client.send_request(&request()).unwrap();

        let session = client.into_inner();
        assert_eq!(session.calls.len(), 1);
        assert_eq!(session.written(), b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn test_send_request_failure_is_final() {
        let session = ScriptedSession::new([]).failing_writes(io::ErrorKind::BrokenPipe);
        let mut client = HttpClient::new(session);

        assert!(matches!(client.send_request(&request()), Err(Error::Io(_))));
        assert_eq!(client.into_inner().calls.len(), 1);
    }

    #[test]
    fn test_receive_across_partial_reads() {
        let mut client = HttpClient::new(ScriptedSession::serving(RESPONSE, 3));
        let received = client.receive_response().unwrap();

        assert_eq!(received.consumed, RESPONSE.len());
        assert_eq!(received.response.status().code(), 200);
        assert_eq!(received.response.body(), b"hello");

        // No read past the end of a complete response
        let session = client.into_inner();
        assert_eq!(session.count(&Call::Read), RESPONSE.len().div_ceil(3));
    }

    #[test]
    fn test_end_of_stream_after_complete_response() {
        let session = ScriptedSession::new([Step::Data(RESPONSE.to_vec()), Step::Eof]);
        let mut client = HttpClient::new(session);

        let received = client.receive_response().unwrap();
        assert_eq!(received.consumed, RESPONSE.len());
    }

    #[test]
    fn test_end_of_stream_ends_close_delimited_body() {
        let data = b"HTTP/1.0 200 OK\r\n\r\nuntil close";
        let session = ScriptedSession::new([Step::Data(data.to_vec()), Step::Eof]);
        let mut client = HttpClient::new(session);

        let received = client.receive_response().unwrap();
        assert_eq!(received.response.version(), Version::Http10);
        assert_eq!(received.response.body(), b"until close");
        assert_eq!(received.consumed, data.len());
    }

    #[test]
    fn test_end_of_stream_mid_body_is_truncation() {
        let session = ScriptedSession::new([Step::Data(RESPONSE[..40].to_vec()), Step::Eof]);
        let mut client = HttpClient::new(session);

        assert!(matches!(
            client.receive_response(),
            Err(Error::Truncated { consumed: 40 })
        ));
    }

    #[test]
    fn test_end_of_stream_before_any_byte() {
        let mut client = HttpClient::new(ScriptedSession::new([Step::Eof]));
        assert!(matches!(client.receive_response(), Err(Error::ConnectionClosed)));
    }

    #[test]
    fn test_read_failure_is_fatal() {
        let session = ScriptedSession::new([
            Step::Data(RESPONSE[..10].to_vec()),
            Step::Fail(io::ErrorKind::ConnectionReset),
            Step::Data(RESPONSE[10..].to_vec()),
        ]);
        let mut client = HttpClient::new(session);

        assert!(matches!(client.receive_response(), Err(Error::Io(_))));
        assert_eq!(client.into_inner().count(&Call::Read), 2);
    }

    #[test]
    fn test_malformed_response() {
        let session = ScriptedSession::new([Step::Data(b"NOT HTTP\r\n\r\n".to_vec())]);
        let mut client = HttpClient::new(session);
        assert!(client.receive_response().is_err());
    }
}
