//! Negotiated TLS parameters
//!
//! `TlsVars` is captured once the handshake completes and describes what was
//! actually negotiated with the peer.

use super::cert::{peer_chain, CertInfo};
use openssl::ssl::{NameType, SslRef};

/// TLS variables available after handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsVars {
    /// Negotiated TLS version (e.g., "TLSv1.3")
    pub version: String,

    /// Negotiated cipher suite
    pub cipher: String,

    /// SNI servername sent by this client
    pub servername: Option<String>,

    /// Whether the session was resumed
    pub sess_reused: bool,

    /// Certificate chain (index 0 is peer cert)
    pub cert_chain: Vec<CertInfo>,
}

impl TlsVars {
    pub fn from_ssl(ssl: &SslRef) -> Self {
        TlsVars {
            version: ssl.version_str().to_string(),
            cipher: ssl
                .current_cipher()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "<undef>".to_string()),
            servername: ssl.servername(NameType::HOST_NAME).map(|s| s.to_string()),
            sess_reused: ssl.session_reused(),
            cert_chain: peer_chain(ssl),
        }
    }

    /// Get certificate info by index (0 = peer cert, 1+ = chain)
    pub fn cert(&self, index: usize) -> Option<&CertInfo> {
        self.cert_chain.get(index)
    }

    /// Subject of the peer certificate
    pub fn peer_subject(&self) -> Option<&str> {
        self.cert(0).map(|c| c.subject.as_str())
    }
}

impl Default for TlsVars {
    fn default() -> Self {
        TlsVars {
            version: "<undef>".to_string(),
            cipher: "<undef>".to_string(),
            servername: None,
            sess_reused: false,
            cert_chain: Vec::new(),
        }
    }
}
