//! TLS session operations
//!
//! This module implements the SessionOps trait for a client TLS connection.
//! A session runs exactly one handshake; application data may only flow once
//! it is established.

use super::config::{ServerIdentity, TlsContext, TlsError};
use super::vars::TlsVars;
use super::Result;
use crate::http::session::SessionOps;
use crate::http::{Error, Result as HttpResult};
use openssl::ssl::{ErrorCode, HandshakeError, Ssl, SslStream};
use openssl::x509::X509VerifyResult;
use std::ffi::c_int;
use std::io::{self, Write};
use std::mem;
use std::net::{IpAddr, TcpStream};

/// `SSL_R_UNEXPECTED_EOF_WHILE_READING`, OpenSSL 3 reports a missing
/// close_notify with this reason
const SSL_R_UNEXPECTED_EOF_WHILE_READING: c_int = 294;

/// Lifecycle of a TLS session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Handshaking,
    Established,
    ShuttingDown,
    Closed,
    /// Absorbing state after a handshake or shutdown failure
    Failed,
}

/// How the peer ended its side of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerClose {
    /// close_notify received
    Notify,
    /// Transport closed without close_notify
    Abrupt,
}

enum Inner {
    Idle(Ssl, TcpStream),
    Established(SslStream<TcpStream>),
    Gone,
}

/// Client TLS session
///
/// Owns the TCP stream for its whole lifetime; the stream is closed when the
/// session is dropped.
pub struct TlsSession {
    inner: Inner,
    state: SessionState,
    identity: ServerIdentity,
    vars: Option<TlsVars>,
    peer_closed: Option<PeerClose>,
}

impl TlsSession {
    /// Bind a connected stream to a context without starting the handshake
    ///
    /// SNI is sent for DNS names only. When the policy asks for it the peer
    /// certificate must match the host name, or the address for IP literals.
    pub fn new(context: &TlsContext, stream: TcpStream) -> Result<Self> {
        let mut ssl = Ssl::new(&context.ctx)?;
        let identity = context.identity().clone();
        let verify = context.policy().verify_hostname;

        match identity.host().parse::<IpAddr>() {
            Ok(ip) => {
                if verify {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(identity.host())?;
                if verify {
                    ssl.param_mut().set_host(identity.host())?;
                }
            }
        }

        Ok(TlsSession {
            inner: Inner::Idle(ssl, stream),
            state: SessionState::Idle,
            identity,
            vars: None,
            peer_closed: None,
        })
    }

    /// Perform the client handshake
    ///
    /// May only be called once. On failure the session is `Failed` and no
    /// application data can be written.
    pub fn handshake(&mut self) -> Result<()> {
        let (ssl, stream) = match mem::replace(&mut self.inner, Inner::Gone) {
            Inner::Idle(ssl, stream) => (ssl, stream),
            other => {
                self.inner = other;
                return Err(TlsError::InvalidState(format!(
                    "handshake requested in state {:?}",
                    self.state
                )));
            }
        };

        self.state = SessionState::Handshaking;
        tracing::debug!(server = %self.identity, "starting TLS handshake");

        match ssl.connect(stream) {
            Ok(stream) => {
                let vars = TlsVars::from_ssl(stream.ssl());
                tracing::info!(
                    server = %self.identity,
                    version = %vars.version,
                    cipher = %vars.cipher,
                    sni = ?vars.servername,
                    peer = ?vars.peer_subject(),
                    reused = vars.sess_reused,
                    "TLS handshake complete"
                );
                for (depth, cert) in vars.cert_chain.iter().enumerate() {
                    tracing::debug!(depth, %cert, "peer certificate");
                }

                self.vars = Some(vars);
                self.inner = Inner::Established(stream);
                self.state = SessionState::Established;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                let reason = describe_handshake_error(e);
                tracing::warn!(server = %self.identity, %reason, "TLS handshake failed");
                Err(TlsError::HandshakeFailed(reason))
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Negotiated parameters, available once established
    pub fn vars(&self) -> Option<&TlsVars> {
        self.vars.as_ref()
    }

    fn established(&mut self) -> HttpResult<&mut SslStream<TcpStream>> {
        match (&mut self.inner, self.state) {
            (Inner::Established(stream), SessionState::Established) => Ok(stream),
            _ => Err(Error::NotEstablished),
        }
    }
}

impl SessionOps for TlsSession {
    fn read(&mut self, buf: &mut [u8]) -> HttpResult<usize> {
        if self.peer_closed.is_some() {
            return Err(Error::EndOfStream);
        }
        let stream = self.established()?;

        let outcome = loop {
            match stream.ssl_read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.code() == ErrorCode::WANT_READ && e.io_error().is_none() => continue,
                Err(e) if e.code() == ErrorCode::ZERO_RETURN => break PeerClose::Notify,
                Err(e) if is_unexpected_eof(&e) => break PeerClose::Abrupt,
                Err(e) => {
                    tracing::debug!(error = %e, "TLS read failed");
                    return Err(Error::Ssl(e));
                }
            }
        };

        tracing::debug!(server = %self.identity, close = ?outcome, "peer closed the stream");
        self.peer_closed = Some(outcome);
        Err(Error::EndOfStream)
    }

    fn write_all(&mut self, buf: &[u8]) -> HttpResult<()> {
        let stream = self.established()?;
        stream.write_all(buf)?;
        stream.flush()?;
        Ok(())
    }

    /// Send close_notify without waiting for the peer's
    fn shutdown(&mut self) -> HttpResult<()> {
        let peer_closed = self.peer_closed;
        let stream = self.established()?;
        let result = stream.shutdown();
        self.state = SessionState::ShuttingDown;

        match result {
            Ok(result) => {
                tracing::debug!(server = %self.identity, ?result, "TLS shutdown");
                self.state = SessionState::Closed;
                Ok(())
            }
            Err(e) if peer_closed == Some(PeerClose::Abrupt) || is_transport_gone(&e) => {
                tracing::debug!(error = %e, "TLS shutdown found the transport closed");
                self.state = SessionState::Closed;
                Err(Error::EndOfStream)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(Error::Ssl(e))
            }
        }
    }
}

/// Transport-level end of stream without close_notify
fn is_unexpected_eof(e: &openssl::ssl::Error) -> bool {
    match e.code() {
        ErrorCode::SYSCALL => e
            .io_error()
            .map_or(true, |io| io.kind() == io::ErrorKind::UnexpectedEof),
        ErrorCode::SSL => e.ssl_error().is_some_and(|stack| {
            stack
                .errors()
                .iter()
                .any(|err| err.reason_code() == SSL_R_UNEXPECTED_EOF_WHILE_READING)
        }),
        _ => false,
    }
}

/// The peer already tore down the raw transport
fn is_transport_gone(e: &openssl::ssl::Error) -> bool {
    is_unexpected_eof(e)
        || e.io_error().is_some_and(|io| {
            matches!(
                io.kind(),
                io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
            )
        })
}

fn describe_handshake_error(e: HandshakeError<TcpStream>) -> String {
    match e {
        HandshakeError::SetupFailure(stack) => stack.to_string(),
        HandshakeError::Failure(mid) | HandshakeError::WouldBlock(mid) => {
            let verify = mid.ssl().verify_result();
            if verify != X509VerifyResult::OK {
                format!("certificate verify failed: {}", verify.error_string())
            } else {
                mid.error().to_string()
            }
        }
    }
}
