//! SSL/TLS protocol policy
//!
//! Client-facing and server-facing connections each get their own
//! [`TlsPolicy`], resolved from independent labels.

pub mod version;

pub use version::{TlsMethod, TlsOptions, TlsPolicy, TlsVersion};

/// Ports assumed to carry TLS when no other hint is available.
pub const TRANSPARENT_SSL_PORTS: [u16; 2] = [443, 8443];

/// Policies for both sides of an intercepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlsPolicies {
    pub client: TlsPolicy,
    pub server: TlsPolicy,
}

impl TlsPolicies {
    pub fn resolve(client: &str, server: &str) -> crate::error::Result<Self> {
        let client = TlsPolicy::from_label(client)?;
        let server = TlsPolicy::from_label(server)?;
        tracing::debug!(?client, ?server, "Resolved SSL/TLS policies");
        Ok(Self { client, server })
    }
}
