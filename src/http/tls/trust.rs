//! Trusted certificate authorities
//!
//! Trust providers hand out a shared, read-only set of anchors. The platform
//! store is loaded at most once per process.

use super::{Result, TlsError};
use openssl::x509::X509;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Read-only set of trusted authority certificates
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorSet {
    certs: Vec<X509>,
}

impl TrustAnchorSet {
    pub fn new(certs: Vec<X509>) -> Self {
        TrustAnchorSet { certs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &X509> {
        self.certs.iter()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

/// Source of trusted authorities for a certificate type and context
pub trait TrustProvider {
    fn trusted_authorities(&self, cert_type: &str, context: &str) -> Result<Arc<TrustAnchorSet>>;
}

static SYSTEM_ANCHORS: OnceLock<Arc<TrustAnchorSet>> = OnceLock::new();

/// The operating system's trust store
///
/// Both lookup arguments are ignored; every caller shares the same set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrustProvider;

impl SystemTrustProvider {
    fn load() -> TrustAnchorSet {
        let loaded = rustls_native_certs::load_native_certs();
        for error in &loaded.errors {
            tracing::warn!(%error, "error reading platform trust store");
        }

        let mut certs = Vec::with_capacity(loaded.certs.len());
        for der in &loaded.certs {
            match X509::from_der(der.as_ref()) {
                Ok(cert) => certs.push(cert),
                Err(e) => tracing::debug!(error = %e, "skipping unparsable platform certificate"),
            }
        }

        if certs.is_empty() {
            tracing::warn!("platform trust store is empty");
        } else {
            tracing::debug!(count = certs.len(), "loaded platform trust anchors");
        }
        TrustAnchorSet::new(certs)
    }
}

impl TrustProvider for SystemTrustProvider {
    fn trusted_authorities(&self, _cert_type: &str, _context: &str) -> Result<Arc<TrustAnchorSet>> {
        Ok(Arc::clone(
            SYSTEM_ANCHORS.get_or_init(|| Arc::new(Self::load())),
        ))
    }
}

/// A fixed set of anchors, typically a private CA or a self-signed server
#[derive(Debug, Clone)]
pub struct FixedTrustProvider {
    anchors: Arc<TrustAnchorSet>,
}

impl FixedTrustProvider {
    pub fn new(anchors: TrustAnchorSet) -> Self {
        FixedTrustProvider {
            anchors: Arc::new(anchors),
        }
    }

    /// Load every certificate in a PEM bundle; private keys are ignored
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let certs = X509::stack_from_pem(pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load certificates: {}", e)))?;
        if certs.is_empty() {
            return Err(TlsError::Certificate(
                "No certificates in PEM input".to_string(),
            ));
        }
        Ok(Self::new(TrustAnchorSet::new(certs)))
    }

    /// Load a PEM bundle from a file
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pem = fs::read(path.as_ref())?;
        Self::from_pem(&pem)
    }
}

impl TrustProvider for FixedTrustProvider {
    fn trusted_authorities(&self, _cert_type: &str, _context: &str) -> Result<Arc<TrustAnchorSet>> {
        Ok(Arc::clone(&self.anchors))
    }
}
