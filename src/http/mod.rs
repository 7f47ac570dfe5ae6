//! HTTP/1.x over a secure session
//!
//! This module provides the request/response model, the incremental response
//! parser and the single-exchange client.
//!
//! # Architecture
//!
//! The HTTP layer is written against the session operations abstraction:
//!
//! - `SessionOps` trait defines the byte-stream operations (read, write, shutdown)
//! - `tls::TlsSession` implements it on top of an OpenSSL client stream
//! - `HttpClient` drives exactly one request/response exchange over any `SessionOps`
//!
//! # Examples
//!
//! ```no_run
//! use http_client_sync_ssl::http::tls::{
//!     DefaultPolicyProvider, ServerIdentity, SystemTrustProvider, TlsContext, TlsSession,
//! };
//! use http_client_sync_ssl::http::{shutdown_gracefully, HttpClient, Request, Version};
//! use std::net::TcpStream;
//!
//! let identity = ServerIdentity::new("example.com", 443);
//! let context = TlsContext::new(&SystemTrustProvider, &DefaultPolicyProvider, identity).unwrap();
//!
//! let stream = TcpStream::connect("example.com:443").unwrap();
//! let mut session = TlsSession::new(&context, stream).unwrap();
//! session.handshake().unwrap();
//!
//! let request = Request::get("/")
//!     .version(Version::Http11)
//!     .header("Host", "example.com")
//!     .build()
//!     .unwrap();
//!
//! let mut client = HttpClient::new(session);
//! client.send_request(&request).unwrap();
//! let received = client.receive_response().unwrap();
//! assert_eq!(received.response.status().code(), 200);
//!
//! shutdown_gracefully(&mut client.into_inner()).unwrap();
//! ```

pub mod chunked;
pub mod client;
pub mod headers;
pub mod message;
pub mod parser;
pub mod session;
pub mod tls;

pub use client::{HttpClient, ReceivedResponse};
pub use headers::Headers;
pub use message::{Request, RequestBuilder, Response, ResponseBuilder, Status, Version};
pub use parser::ResponseParser;
pub use session::{shutdown_gracefully, SessionOps};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Ssl(#[from] openssl::ssl::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Invalid HTTP status: {0}")]
    InvalidStatus(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("Header section too large")]
    HeaderLimit,

    #[error("Body too large")]
    BodyLimit,

    #[error("Incomplete message")]
    Incomplete,

    #[error("End of stream")]
    EndOfStream,

    #[error("Connection closed before a response was received")]
    ConnectionClosed,

    #[error("Response truncated after {consumed} bytes")]
    Truncated { consumed: usize },

    #[error("Session is not established")]
    NotEstablished,
}

/// Maximum size of the status line plus header section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum number of header fields per message
///
/// The shortest field line (`a:` plus CRLF) is four bytes, so a header
/// section always hits `MAX_HEADER_BYTES` first. The count only bounds
/// chunked trailers.
pub const MAX_HEADERS: usize = MAX_HEADER_BYTES / 4;

/// Maximum size of a decoded response body
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// Client identifier sent as `User-Agent`
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
