//! Name resolution and TCP connection establishment
//!
//! Resolution produces an ordered list of endpoints; the connector walks that
//! list once and keeps the first connection that succeeds.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

/// A resolved network address plus port
pub type Endpoint = SocketAddr;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid host: {0:?}")]
    InvalidHost(String),

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("No addresses found for {0}")]
    NoAddresses(String),

    #[error("No endpoints to connect to")]
    NoEndpoints,

    #[error("Failed to connect after {attempts} attempt(s): {source}")]
    Connect {
        attempts: usize,
        #[source]
        source: io::Error,
    },
}

/// Maps a host and port to candidate endpoints
pub trait Resolver {
    /// Resolve `host` once. The returned list is never empty.
    fn resolve(&self, host: &str, port: u16) -> Result<Vec<Endpoint>>;
}

/// Resolver backed by the system name service
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> Result<Vec<Endpoint>> {
        if host.is_empty() {
            return Err(Error::InvalidHost(host.to_string()));
        }

        let endpoints: Vec<Endpoint> = (host, port)
            .to_socket_addrs()
            .map_err(|source| Error::Resolve {
                host: host.to_string(),
                source,
            })?
            .collect();

        if endpoints.is_empty() {
            return Err(Error::NoAddresses(host.to_string()));
        }

        tracing::debug!(host, port, ?endpoints, "resolved");
        Ok(endpoints)
    }
}

/// Resolver that answers every lookup with a fixed endpoint list
///
/// The port argument is ignored. Useful for pointing a real host name at a
/// local test server.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    endpoints: Vec<Endpoint>,
}

impl StaticResolver {
    pub fn new(endpoints: impl Into<Vec<Endpoint>>) -> Self {
        StaticResolver {
            endpoints: endpoints.into(),
        }
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, host: &str, _port: u16) -> Result<Vec<Endpoint>> {
        if self.endpoints.is_empty() {
            return Err(Error::NoAddresses(host.to_string()));
        }
        Ok(self.endpoints.clone())
    }
}

/// Parse a port argument
///
/// Accepts a decimal port number or one of the well-known service names
/// `https` and `http`.
pub fn parse_port(port: &str) -> Result<u16> {
    match port {
        "https" => Ok(443),
        "http" => Ok(80),
        _ => port
            .parse::<u16>()
            .map_err(|_| Error::InvalidPort(port.to_string())),
    }
}

/// Connect to the first reachable endpoint, trying each in order
pub fn connect(endpoints: &[Endpoint]) -> Result<TcpStream> {
    let mut last_error = None;

    for (attempt, endpoint) in endpoints.iter().enumerate() {
        tracing::debug!(%endpoint, attempt = attempt + 1, "connecting");
        match connect_endpoint(endpoint) {
            Ok(stream) => {
                tracing::debug!(%endpoint, "connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::warn!(%endpoint, error = %e, "connection attempt failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(source) => Err(Error::Connect {
            attempts: endpoints.len(),
            source,
        }),
        None => Err(Error::NoEndpoints),
    }
}

fn connect_endpoint(endpoint: &Endpoint) -> io::Result<TcpStream> {
    let socket = Socket::new(
        Domain::for_address(*endpoint),
        Type::STREAM,
        Some(Protocol::TCP),
    )?;

    // The request goes out in a single write
    socket.set_nodelay(true)?;
    socket.connect(&(*endpoint).into())?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("443").unwrap(), 443);
        assert_eq!(parse_port("8443").unwrap(), 8443);
        assert_eq!(parse_port("https").unwrap(), 443);
        assert_eq!(parse_port("http").unwrap(), 80);
        assert!(matches!(parse_port("65536"), Err(Error::InvalidPort(_))));
        assert!(matches!(parse_port("gopher"), Err(Error::InvalidPort(_))));
        assert!(matches!(parse_port(""), Err(Error::InvalidPort(_))));
    }

    #[test]
    fn test_system_resolver_ip_literal() {
        let endpoints = SystemResolver.resolve("127.0.0.1", 8443).unwrap();
        assert_eq!(endpoints, vec!["127.0.0.1:8443".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_system_resolver_empty_host() {
        assert!(matches!(
            SystemResolver.resolve("", 443),
            Err(Error::InvalidHost(_))
        ));
    }

    #[test]
    fn test_static_resolver() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let resolver = StaticResolver::new(vec![addr]);

        assert_eq!(resolver.resolve("example.com", 443).unwrap(), vec![addr]);
        assert!(matches!(
            StaticResolver::new(Vec::new()).resolve("example.com", 443),
            Err(Error::NoAddresses(_))
        ));
    }

    #[test]
    fn test_connect_skips_unreachable_endpoints() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let live = listener.local_addr().unwrap();

        // Grab a port nobody listens on
        let dead = {
            let probe = TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap()
        };

        let stream = connect(&[dead, live]).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), live);
        assert!(stream.nodelay().unwrap());
    }

    #[test]
    fn test_connect_all_endpoints_fail() {
        let dead = {
            let probe = TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap()
        };

        match connect(&[dead]) {
            Err(Error::Connect { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected connect error, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(connect(&[]), Err(Error::NoEndpoints)));
    }
}
