//! http-client-sync-ssl - synchronous HTTPS client
//!
//! This crate resolves a host, connects over TCP, performs a TLS client
//! handshake, sends a single HTTP GET and reads exactly one response before
//! closing the TLS session gracefully.

pub mod fetch;
pub mod http;
pub mod net;

pub use fetch::{ErrorCategory, FetchConfig, FetchError, FetchOutcome, Fetcher};
