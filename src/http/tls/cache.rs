//! Client session cache
//!
//! Holds the resumable sessions the engine produces, keyed by server. A
//! single-request client never resumes; the cache only records.

use super::config::ServerIdentity;
use openssl::ssl::SslSession;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub struct SessionCache {
    sessions: Mutex<HashMap<ServerIdentity, SslSession>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session, replacing any earlier one for the same server
    pub fn insert(&self, identity: ServerIdentity, session: SslSession) {
        tracing::debug!(server = %identity, "caching TLS session");
        self.lock().insert(identity, session);
    }

    pub fn get(&self, identity: &ServerIdentity) -> Option<SslSession> {
        self.lock().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ServerIdentity, SslSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.lock().keys()).finish()
    }
}
