//! Option resolution for an intercepting HTTP/HTTPS proxy
//!
//! Raw [`ProxyOptions`] go in, a single immutable [`ProxyConfig`] comes out.
//! Everything that can be wrong with the options is reported here, before
//! any listener starts.

pub mod auth;
pub mod certs;
pub mod commands;
pub mod config;
pub mod error;
pub mod matcher;
pub mod mode;
pub mod paths;
pub mod platform;
pub mod tls;

pub use config::{ProxyConfig, ProxyOptions};
pub use error::{ConfigError, Result};

pub const NAMEVERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Option strings that are present but empty count as not given.
pub(crate) fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|s| !s.is_empty())
}
