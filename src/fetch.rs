//! One HTTPS fetch, end to end
//!
//! `Fetcher` sequences the phases of an invocation: resolve, connect,
//! handshake, exchange, print, shut down. Every phase runs once. Failures are
//! tagged with the phase they came from in `FetchError`, which is the single
//! error boundary the binary reports from.

use crate::http::tls::{
    DefaultPolicyProvider, SecurityPolicyProvider, ServerIdentity, SystemTrustProvider,
    TlsContext, TlsError, TlsSession, TrustProvider,
};
use crate::http::{
    self, shutdown_gracefully, HttpClient, ReceivedResponse, Request, Response, SessionOps,
    Version, USER_AGENT,
};
use crate::net::{self, Resolver, SystemResolver};
use std::fmt;
use std::io::{self, Write};

/// Inputs of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub host: String,
    /// Port number or service name, parsed during resolution
    pub port: String,
    pub target: String,
    pub version: Version,
    pub user_agent: String,
}

impl FetchConfig {
    /// `version_arg` selects HTTP/1.0 only when it is exactly `1.0`
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        target: impl Into<String>,
        version_arg: Option<&str>,
    ) -> Self {
        FetchConfig {
            host: host.into(),
            port: port.into(),
            target: target.into(),
            version: Version::from_arg(version_arg),
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The GET request this configuration describes
    pub fn request(&self) -> http::Result<Request> {
        Request::get(self.target.as_str())
            .version(self.version)
            .header("Host", self.host.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .build()
    }
}

/// Broad class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Handshake,
    Parse,
    Shutdown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::Handshake => "handshake",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Shutdown => "shutdown",
        })
    }
}

/// Fetch errors, one variant per phase
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Resolution failed: {0}")]
    Resolution(#[source] net::Error),

    #[error("Connection failed: {0}")]
    Connection(#[source] net::Error),

    #[error("TLS: {0}")]
    Handshake(#[from] TlsError),

    #[error("Exchange failed: {0}")]
    Exchange(#[source] http::Error),

    #[error("Shutdown failed: {0}")]
    Shutdown(#[source] http::Error),

    #[error("Failed to write output: {0}")]
    Console(#[from] io::Error),
}

impl FetchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::Resolution(_) | FetchError::Connection(_) | FetchError::Console(_) => {
                ErrorCategory::Transport
            }
            FetchError::Handshake(_) => ErrorCategory::Handshake,
            FetchError::Exchange(e) => match e {
                http::Error::Io(_)
                | http::Error::Ssl(_)
                | http::Error::EndOfStream
                | http::Error::ConnectionClosed
                | http::Error::NotEstablished => ErrorCategory::Transport,
                _ => ErrorCategory::Parse,
            },
            FetchError::Shutdown(_) => ErrorCategory::Shutdown,
        }
    }
}

/// Result of a successful fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    /// Bytes of the stream the response occupied
    pub consumed: usize,
}

/// Runs one fetch with pluggable resolution, trust and policy
pub struct Fetcher<R = SystemResolver, T = SystemTrustProvider, P = DefaultPolicyProvider> {
    config: FetchConfig,
    resolver: R,
    trust: T,
    policy: P,
}

impl Fetcher {
    /// System resolver, platform trust store, default policy
    pub fn new(config: FetchConfig) -> Self {
        Fetcher {
            config,
            resolver: SystemResolver,
            trust: SystemTrustProvider,
            policy: DefaultPolicyProvider,
        }
    }
}

impl<R, T, P> Fetcher<R, T, P> {
    pub fn with_resolver<R2: Resolver>(self, resolver: R2) -> Fetcher<R2, T, P> {
        Fetcher {
            config: self.config,
            resolver,
            trust: self.trust,
            policy: self.policy,
        }
    }

    pub fn with_trust<T2: TrustProvider>(self, trust: T2) -> Fetcher<R, T2, P> {
        Fetcher {
            config: self.config,
            resolver: self.resolver,
            trust,
            policy: self.policy,
        }
    }

    pub fn with_policy<P2: SecurityPolicyProvider>(self, policy: P2) -> Fetcher<R, T, P2> {
        Fetcher {
            config: self.config,
            resolver: self.resolver,
            trust: self.trust,
            policy,
        }
    }
}

impl<R: Resolver, T: TrustProvider, P: SecurityPolicyProvider> Fetcher<R, T, P> {
    /// Perform the fetch, writing progress and the response to `out`
    pub fn run<W: Write>(&self, out: &mut W) -> Result<FetchOutcome, FetchError> {
        let request = self.config.request().map_err(FetchError::Exchange)?;

        let port = net::parse_port(&self.config.port).map_err(FetchError::Resolution)?;
        let endpoints = self
            .resolver
            .resolve(&self.config.host, port)
            .map_err(FetchError::Resolution)?;
        let stream = net::connect(&endpoints).map_err(FetchError::Connection)?;

        let identity = ServerIdentity::new(self.config.host.as_str(), port);
        let context = TlsContext::new(&self.trust, &self.policy, identity)?;
        let mut session = TlsSession::new(&context, stream)?;

        writeln!(out, "shaking hands")?;
        session.handshake()?;
        writeln!(out, "now we're talking")?;

        exchange_and_close(session, &request, out)
    }
}

/// Run the exchange, print the response and close the session
///
/// The session is shut down exactly once, after the read phase, whatever the
/// exchange outcome. A shutdown failure after a failed exchange is only
/// logged; the exchange error is the one reported.
pub fn exchange_and_close<S: SessionOps, W: Write>(
    session: S,
    request: &Request,
    out: &mut W,
) -> Result<FetchOutcome, FetchError> {
    let mut client = HttpClient::new(session);
    let exchanged = client
        .send_request(request)
        .and_then(|()| client.receive_response());

    let mut session = client.into_inner();

    let ReceivedResponse { response, consumed } = match exchanged {
        Ok(received) => received,
        Err(e) => {
            if let Err(shutdown) = shutdown_gracefully(&mut session) {
                tracing::warn!(error = %shutdown, "shutdown after failed exchange");
            }
            return Err(FetchError::Exchange(e));
        }
    };

    let printed = writeln!(out, "Parse: {} bytes", consumed)
        .and_then(|()| writeln!(out, "{}", response));

    shutdown_gracefully(&mut session).map_err(FetchError::Shutdown)?;
    printed?;

    Ok(FetchOutcome { response, consumed })
}
