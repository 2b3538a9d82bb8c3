use crate::auth::AuthOptions;
use crate::certs::CA_DIR;
use crate::error::{ConfigError, Result};
use crate::mode::ModeOptions;
use crate::tls::TRANSPARENT_SSL_PORTS;
use serde::{Deserialize, Serialize};

/// Raw proxy options, as collected from the command line, a config file or
/// the environment. Nothing here has been validated yet.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProxyOptions {
    #[serde(default)]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cadir")]
    pub cadir: String,
    #[serde(default)]
    pub clientcerts: Option<String>,
    #[serde(default)]
    pub no_upstream_cert: bool,
    /// Size with an optional `k`, `m` or `g` suffix
    #[serde(default)]
    pub body_size_limit: Option<String>,

    // Routing
    #[serde(default)]
    pub transparent_proxy: bool,
    #[serde(default)]
    pub socks_proxy: bool,
    #[serde(default)]
    pub reverse_proxy: Option<String>,
    #[serde(default)]
    pub upstream_proxy: Option<String>,
    #[serde(default)]
    pub http_form_in: Option<String>,
    #[serde(default)]
    pub http_form_out: Option<String>,

    // Interception bypass
    #[serde(default)]
    pub ignore_hosts: Vec<String>,
    #[serde(default)]
    pub tcp_hosts: Vec<String>,

    // Authentication
    #[serde(default)]
    pub auth_nonanonymous: bool,
    #[serde(default)]
    pub auth_singleuser: Option<String>,
    #[serde(default)]
    pub auth_htpasswd: Option<String>,

    // SSL
    #[serde(default)]
    pub ciphers_client: Option<String>,
    #[serde(default)]
    pub ciphers_server: Option<String>,
    #[serde(default)]
    pub certs: Vec<String>,
    #[serde(default)]
    pub certforward: bool,
    #[serde(default = "default_ssl_version")]
    pub ssl_version_client: String,
    #[serde(default = "default_ssl_version")]
    pub ssl_version_server: String,
    #[serde(default = "default_ssl_ports")]
    pub ssl_ports: Vec<u16>,
}

fn default_port() -> u16 {
    8080
}

fn default_cadir() -> String {
    CA_DIR.to_string()
}

fn default_ssl_version() -> String {
    "secure".to_string()
}

fn default_ssl_ports() -> Vec<u16> {
    TRANSPARENT_SSL_PORTS.to_vec()
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            addr: String::new(),
            port: default_port(),
            cadir: default_cadir(),
            clientcerts: None,
            no_upstream_cert: false,
            body_size_limit: None,
            transparent_proxy: false,
            socks_proxy: false,
            reverse_proxy: None,
            upstream_proxy: None,
            http_form_in: None,
            http_form_out: None,
            ignore_hosts: Vec::new(),
            tcp_hosts: Vec::new(),
            auth_nonanonymous: false,
            auth_singleuser: None,
            auth_htpasswd: None,
            ciphers_client: None,
            ciphers_server: None,
            certs: Vec::new(),
            certforward: false,
            ssl_version_client: default_ssl_version(),
            ssl_version_server: default_ssl_version(),
            ssl_ports: default_ssl_ports(),
        }
    }
}

impl ProxyOptions {
    pub fn mode_options(&self) -> ModeOptions {
        ModeOptions {
            transparent: self.transparent_proxy,
            socks5: self.socks_proxy,
            reverse: self.reverse_proxy.clone(),
            upstream: self.upstream_proxy.clone(),
            http_form_in: self.http_form_in.clone(),
            http_form_out: self.http_form_out.clone(),
            ssl_ports: self.ssl_ports.clone(),
        }
    }

    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            nonanonymous: self.auth_nonanonymous,
            singleuser: self.auth_singleuser.clone(),
            htpasswd: self.auth_htpasswd.clone(),
        }
    }

    /// Reject option sets that ask for more than one routing mode or more
    /// than one authentication backend.
    pub fn validate(&self) -> Result<()> {
        for requested in [self.mode_options().requested(), self.auth_options().requested()] {
            if requested.len() > 1 {
                tracing::warn!(options = ?requested, "Conflicting options requested");
                return Err(ConfigError::MutuallyExclusive {
                    options: requested.into_iter().map(String::from).collect(),
                });
            }
        }
        Ok(())
    }
}

/// Parse a human readable size such as `512`, `10k`, `3M` or `1g`.
///
/// Returns `None` for an empty string (no limit). Zero is rejected; leave the
/// option unset for an unlimited body size.
pub fn parse_size(spec: &str) -> Result<Option<u64>> {
    let invalid = || {
        ConfigError::invalid_format(
            "size specification",
            spec,
            "Expected a positive integer with an optional k, m or g suffix",
        )
    };

    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let lower = trimmed.to_ascii_lowercase();
    let (digits, multiplier) = match lower.as_bytes()[lower.len() - 1] {
        b'k' => (&lower[..lower.len() - 1], 1024u64),
        b'm' => (&lower[..lower.len() - 1], 1024 * 1024),
        b'g' => (&lower[..lower.len() - 1], 1024 * 1024 * 1024),
        _ => (lower.as_str(), 1),
    };
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let size = value.checked_mul(multiplier).ok_or_else(invalid)?;
    if size == 0 {
        return Err(invalid());
    }
    Ok(Some(size))
}
