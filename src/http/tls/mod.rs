//! TLS client support
//!
//! This module implements the client side of HTTPS on top of OpenSSL.
//!
//! # Architecture
//!
//! Configuration is assembled from two independent strategies:
//!
//! 1. `TrustProvider` supplies the trusted certificate authorities
//! 2. `SecurityPolicyProvider` supplies the negotiation parameters
//!
//! Both are consumed once by `TlsContext`, which also owns the client session
//! cache. A `TlsSession` is created from a context and a connected TCP
//! stream, runs exactly one handshake and then implements `SessionOps`, so
//! the HTTP layer uses it without knowing about TLS.
//!
//! # Features
//!
//! - TLS 1.2 and TLS 1.3 by default, other ranges through `SecurityPolicy`
//! - Server name indication and host name verification
//! - Platform trust store, or fixed trust anchors from PEM
//! - Optional CRL enforcement for the whole chain
//! - Client-side session cache
//!
//! # Examples
//!
//! ```no_run
//! use http_client_sync_ssl::http::tls::{
//!     DefaultPolicyProvider, FixedTrustProvider, ServerIdentity, TlsContext, TlsSession,
//! };
//! use std::net::TcpStream;
//!
//! let trust = FixedTrustProvider::from_pem_file("ca.pem").unwrap();
//! let identity = ServerIdentity::new("localhost", 8443);
//! let context = TlsContext::new(&trust, &DefaultPolicyProvider, identity).unwrap();
//!
//! let stream = TcpStream::connect("127.0.0.1:8443").unwrap();
//! let mut session = TlsSession::new(&context, stream).unwrap();
//! session.handshake().unwrap();
//! println!("{}", session.vars().unwrap().version);
//! ```

pub mod cache;
pub mod cert;
pub mod config;
pub mod session;
pub mod trust;
pub mod vars;

pub use cache::SessionCache;
pub use cert::CertInfo;
pub use config::{
    DefaultPolicyProvider, SecurityPolicy, SecurityPolicyProvider, ServerIdentity, TlsContext,
    TlsError, TlsVersion,
};
pub use session::{SessionState, TlsSession};
pub use trust::{FixedTrustProvider, SystemTrustProvider, TrustAnchorSet, TrustProvider};
pub use vars::TlsVars;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
