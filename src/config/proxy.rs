//! The resolved, immutable proxy configuration

use super::schema::{parse_size, ProxyOptions};
use crate::auth::{select_authenticator, Authenticator};
use crate::certs::{load_cert_specs, CertStore, CONF_BASENAME};
use crate::error::Result;
use crate::matcher::HostMatcher;
use crate::mode::{resolve_mode, ProxyMode};
use crate::paths;
use crate::platform::{self, DestinationResolver};
use crate::tls::{TlsPolicies, TlsPolicy};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the connection handlers need to know, resolved once at
/// startup and never mutated afterwards.
#[derive(Debug)]
pub struct ProxyConfig {
    host: String,
    port: u16,
    server_version: String,
    ciphers_client: Option<String>,
    ciphers_server: Option<String>,
    clientcerts: Option<PathBuf>,
    no_upstream_cert: bool,
    body_size_limit: Option<u64>,
    mode: ProxyMode,
    check_ignore: HostMatcher,
    check_tcp: HostMatcher,
    authenticator: Arc<dyn Authenticator>,
    cadir: PathBuf,
    certstore: CertStore,
    certforward: bool,
    tls: TlsPolicies,
    ssl_ports: Vec<u16>,
}

impl ProxyConfig {
    pub fn from_options(options: &ProxyOptions) -> Result<Self> {
        Self::from_options_with_resolver(options, platform::resolver())
    }

    /// Like [`from_options`](Self::from_options) with an explicit transparent
    /// mode resolver in place of the platform's.
    pub fn from_options_with_resolver(
        options: &ProxyOptions,
        resolver: Option<Arc<dyn DestinationResolver>>,
    ) -> Result<Self> {
        options.validate()?;

        let body_size_limit = match &options.body_size_limit {
            Some(spec) => parse_size(spec)?,
            None => None,
        };

        let mode = resolve_mode(&options.mode_options(), resolver)?;

        let clientcerts = match &options.clientcerts {
            Some(dir) => {
                let dir = paths::expand_user(dir)?;
                paths::require_dir("Client certificate directory", &dir)?;
                Some(dir)
            }
            None => None,
        };

        let authenticator = select_authenticator(&options.auth_options())?;
        let certs = load_cert_specs(&options.certs)?;

        let check_ignore = HostMatcher::new(options.ignore_hosts.iter().cloned())?;
        let check_tcp = HostMatcher::new(options.tcp_hosts.iter().cloned())?;

        let cadir = paths::absolute(&options.cadir)?;
        let mut certstore = CertStore::from_store(&cadir, CONF_BASENAME)?;
        certstore.add_specs(&certs)?;

        let tls = TlsPolicies::resolve(&options.ssl_version_client, &options.ssl_version_server)?;

        let config = Self {
            host: options.addr.clone(),
            port: options.port,
            server_version: crate::NAMEVERSION.to_string(),
            ciphers_client: options.ciphers_client.clone(),
            ciphers_server: options.ciphers_server.clone(),
            clientcerts,
            no_upstream_cert: options.no_upstream_cert,
            body_size_limit,
            mode,
            check_ignore,
            check_tcp,
            authenticator,
            cadir,
            certstore,
            certforward: options.certforward,
            tls,
            ssl_ports: options.ssl_ports.clone(),
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            mode = %config.mode.kind(),
            auth = %config.authenticator.backend(),
            certs = config.certstore.entries().len(),
            ignore_patterns = config.check_ignore.patterns().len(),
            tcp_patterns = config.check_tcp.patterns().len(),
            "Proxy configuration resolved"
        );
        Ok(config)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn ciphers_client(&self) -> Option<&str> {
        self.ciphers_client.as_deref()
    }

    pub fn ciphers_server(&self) -> Option<&str> {
        self.ciphers_server.as_deref()
    }

    pub fn clientcerts(&self) -> Option<&Path> {
        self.clientcerts.as_deref()
    }

    pub fn no_upstream_cert(&self) -> bool {
        self.no_upstream_cert
    }

    /// `None` means unlimited.
    pub fn body_size_limit(&self) -> Option<u64> {
        self.body_size_limit
    }

    pub fn mode(&self) -> &ProxyMode {
        &self.mode
    }

    /// Hosts whose traffic is passed through without interception.
    pub fn check_ignore(&self) -> &HostMatcher {
        &self.check_ignore
    }

    /// Hosts whose traffic is relayed as raw TCP.
    pub fn check_tcp(&self) -> &HostMatcher {
        &self.check_tcp
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    pub fn cadir(&self) -> &Path {
        &self.cadir
    }

    pub fn certstore(&self) -> &CertStore {
        &self.certstore
    }

    pub fn certforward(&self) -> bool {
        self.certforward
    }

    pub fn tls_client(&self) -> &TlsPolicy {
        &self.tls.client
    }

    pub fn tls_server(&self) -> &TlsPolicy {
        &self.tls.server
    }

    pub fn ssl_ports(&self) -> &[u16] {
        &self.ssl_ports
    }
}
