//! TLS configuration
//!
//! This module turns a trust provider, a security policy and a server
//! identity into an immutable client context.

use super::cache::SessionCache;
use super::trust::TrustProvider;
use super::Result;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslSessionCacheMode, SslVerifyMode};
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use std::fmt;
use std::sync::Arc;

/// Certificate type passed to trust providers
pub const CERT_TYPE_CLIENT: &str = "tls-client";

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> openssl::ssl::SslVersion {
        use openssl::ssl::SslVersion;
        match self {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

/// Negotiation parameters
///
/// `None` leaves the corresponding engine default in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub min_version: Option<TlsVersion>,
    pub max_version: Option<TlsVersion>,
    /// Cipher list for TLS 1.2 and below
    pub cipher_list: Option<String>,
    /// Cipher suites for TLS 1.3
    pub ciphersuites: Option<String>,
    /// Check that the peer certificate names the server
    pub verify_hostname: bool,
    /// Demand revocation status (CRLs) for every certificate in the chain
    pub require_cert_revocation_info: bool,
}

impl SecurityPolicy {
    /// The engine's own defaults, revocation checking included
    pub fn engine_defaults() -> Self {
        SecurityPolicy {
            min_version: Some(TlsVersion::Tls12),
            max_version: None,
            cipher_list: None,
            ciphersuites: None,
            verify_hostname: true,
            require_cert_revocation_info: true,
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::engine_defaults()
    }
}

/// Source of negotiation parameters
pub trait SecurityPolicyProvider {
    fn resolve(&self) -> SecurityPolicy;
}

/// Engine defaults with revocation information not required
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicyProvider;

impl SecurityPolicyProvider for DefaultPolicyProvider {
    fn resolve(&self) -> SecurityPolicy {
        SecurityPolicy {
            require_cert_revocation_info: false,
            ..SecurityPolicy::engine_defaults()
        }
    }
}

impl SecurityPolicyProvider for SecurityPolicy {
    fn resolve(&self) -> SecurityPolicy {
        self.clone()
    }
}

/// Host and port of the server being contacted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerIdentity {
    host: String,
    port: u16,
}

impl ServerIdentity {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ServerIdentity {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Client TLS context (immutable after construction)
///
/// Binds the trust anchors, the resolved policy, the session cache and the
/// server identity used for SNI and verification.
#[derive(Clone)]
pub struct TlsContext {
    pub(crate) ctx: SslContext,
    identity: ServerIdentity,
    policy: SecurityPolicy,
    cache: Arc<SessionCache>,
}

impl TlsContext {
    pub fn new(
        trust: &dyn TrustProvider,
        policy: &dyn SecurityPolicyProvider,
        identity: ServerIdentity,
    ) -> Result<Self> {
        let policy = policy.resolve();
        let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;

        builder.set_verify(SslVerifyMode::PEER);
        builder.set_min_proto_version(policy.min_version.map(|v| v.to_openssl_version()))?;
        builder.set_max_proto_version(policy.max_version.map(|v| v.to_openssl_version()))?;
        if let Some(ref ciphers) = policy.cipher_list {
            builder.set_cipher_list(ciphers)?;
        }
        if let Some(ref ciphers) = policy.ciphersuites {
            builder.set_ciphersuites(ciphers)?;
        }

        let anchors = trust.trusted_authorities(CERT_TYPE_CLIENT, identity.host())?;
        let mut store = X509StoreBuilder::new()?;
        for cert in anchors.iter() {
            if let Err(e) = store.add_cert(cert.clone()) {
                tracing::debug!(error = %e, "skipping trust anchor");
            }
        }
        if policy.require_cert_revocation_info {
            store.set_flags(X509VerifyFlags::CRL_CHECK | X509VerifyFlags::CRL_CHECK_ALL)?;
        }
        builder.set_cert_store(store.build());

        let cache = Arc::new(SessionCache::new());
        builder.set_session_cache_mode(SslSessionCacheMode::CLIENT);
        {
            let cache = Arc::clone(&cache);
            let identity = identity.clone();
            builder.set_new_session_callback(move |_ssl, session| {
                cache.insert(identity.clone(), session);
            });
        }

        tracing::debug!(
            server = %identity,
            anchors = anchors.len(),
            min_version = ?policy.min_version,
            max_version = ?policy.max_version,
            revocation = policy.require_cert_revocation_info,
            "TLS context ready"
        );

        Ok(TlsContext {
            ctx: builder.build(),
            identity,
            policy,
            cache,
        })
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Sessions handed out by the engine for this context
    pub fn session_cache(&self) -> &SessionCache {
        &self.cache
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .field("cached_sessions", &self.cache.len())
            .finish()
    }
}
