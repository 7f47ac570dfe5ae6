//! In-process TLS test server
//!
//! Serves one canned response over TLS on 127.0.0.1 with the bundled
//! `example.com` certificate, then closes the connection as instructed.

#![allow(dead_code)]

use http_client_sync_ssl::http::tls::FixedTrustProvider;
use http_client_sync_ssl::net::StaticResolver;
use openssl::pkey::PKey;
use openssl::ssl::{SslAcceptor, SslMethod, SslVersion};
use openssl::x509::X509;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

pub const FIXTURE: &str = include_str!("../fixtures/example.com.pem");

/// How the server ends the connection after writing its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Close {
    /// Send close_notify, then close the socket
    Notify,
    /// Close the socket without close_notify
    Abrupt,
}

pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Option<Vec<u8>>>,
}

impl TestServer {
    pub fn spawn(response: &[u8], close: Close) -> Self {
        Self::spawn_with(response, close, None)
    }

    pub fn spawn_with(response: &[u8], close: Close, max_version: Option<SslVersion>) -> Self {
        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor
            .set_certificate(&X509::from_pem(FIXTURE.as_bytes()).unwrap())
            .unwrap();
        acceptor
            .set_private_key(&PKey::private_key_from_pem(FIXTURE.as_bytes()).unwrap())
            .unwrap();
        acceptor.set_max_proto_version(max_version).unwrap();
        let acceptor = acceptor.build();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = response.to_vec();

        let handle = thread::spawn(move || {
            let (tcp, _) = listener.accept().unwrap();
            let mut tls = acceptor.accept(tcp).ok()?;

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match tls.read(&mut buf) {
                    Ok(0) | Err(_) => return Some(request),
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            tls.write_all(&response).unwrap();
            if close == Close::Notify {
                let _ = tls.shutdown();
            }
            Some(request)
        });

        TestServer { addr, handle }
    }

    /// Resolver pointing any host name at this server
    pub fn resolver(&self) -> StaticResolver {
        StaticResolver::new(vec![self.addr])
    }

    /// Request bytes received, or `None` if the handshake never completed
    pub fn join(self) -> Option<Vec<u8>> {
        self.handle.join().unwrap()
    }
}

/// Trust exactly the server's self-signed certificate
pub fn fixture_trust() -> FixedTrustProvider {
    FixedTrustProvider::from_pem(FIXTURE.as_bytes()).unwrap()
}
