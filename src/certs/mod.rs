//! Certificate specifications and the store they are ingested into

pub mod spec;
pub mod store;

pub use spec::{load_cert_specs, CertSpec};
pub use store::{CertEntry, CertStore};

/// Base name of the CA files inside the certificate directory.
pub const CONF_BASENAME: &str = "mitmproxy";

/// Default certificate directory.
pub const CA_DIR: &str = "~/.mitmproxy";
