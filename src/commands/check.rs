use crate::config::{ProxyConfig, ProxyOptions};
use crate::error::{ConfigError, Result};
use crate::mode::ProxyMode;
use tracing::{info, warn};

/// Resolve the options into a [`ProxyConfig`] and log what was decided.
pub fn run_config_check(options: &ProxyOptions) -> Result<ProxyConfig> {
    info!("Running configuration check...");
    let config = ProxyConfig::from_options(options)?;

    let bind = if config.host().is_empty() {
        "*"
    } else {
        config.host()
    };
    info!("Listen address: {}:{}", bind, config.port());
    info!("Mode: {}", config.mode().kind());
    info!(
        "  HTTP form in/out: {}/{}",
        config.mode().http_form_in(),
        config.mode().http_form_out()
    );
    match config.mode() {
        ProxyMode::Reverse(m) => info!("  Reverse target: {}", m.server),
        ProxyMode::Upstream(m) => info!("  Upstream proxy: {}", m.server),
        ProxyMode::Transparent(m) => info!("  SSL ports: {:?}", m.ssl_ports),
        ProxyMode::Socks5(m) => info!("  SSL ports: {:?}", m.ssl_ports),
        ProxyMode::Regular(_) => {}
    }

    info!("Authentication: {}", config.authenticator().backend());
    match config.body_size_limit() {
        Some(limit) => info!("Body size limit: {} bytes", limit),
        None => info!("Body size limit: unlimited"),
    }
    info!("Ignore patterns: {:?}", config.check_ignore().patterns());
    info!("TCP patterns: {:?}", config.check_tcp().patterns());

    info!("Certificate directory: {}", config.cadir().display());
    if config.certstore().ca().is_none() {
        warn!("No CA certificate found in {}", config.cadir().display());
    }
    for entry in config.certstore().entries() {
        info!("  {} -> {}", entry.domain, entry.path.display());
    }

    for (side, label) in [
        ("client", &options.ssl_version_client),
        ("server", &options.ssl_version_server),
    ] {
        let version: crate::tls::TlsVersion = label.parse()?;
        if version.is_insecure() {
            warn!("SSL version '{}' for {} connections is INSECURE", version, side);
        }
    }
    info!(
        "SSL policy client={:?} server={:?}",
        config.tls_client(),
        config.tls_server()
    );

    info!("Configuration OK");
    Ok(config)
}

pub fn show_options(options: &ProxyOptions) -> Result<String> {
    serde_json::to_string_pretty(options).map_err(|e| ConfigError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_errors() {
        let options = ProxyOptions {
            ssl_version_client: "bogus".into(),
            ..Default::default()
        };
        assert!(run_config_check(&options).is_err());
    }

    #[test]
    fn test_check_accepts_valid_options() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = ProxyOptions {
            cadir: dir.path().display().to_string(),
            upstream_proxy: Some("http://proxy:3128".into()),
            ssl_version_server: "all".into(),
            ..Default::default()
        };
        let config = run_config_check(&options).unwrap();
        assert_eq!(config.mode().server().unwrap().port, 3128);
    }

    #[test]
    fn test_show_options_is_json() {
        let json = show_options(&ProxyOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["port"], 8080);
        assert_eq!(value["ssl_version_client"], "secure");
    }
}
