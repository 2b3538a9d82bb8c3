use super::schema::ProxyOptions;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use std::path::Path;

pub const ENV_PREFIX: &str = "MITMPROXY_";

// Defaults come from the serde attributes on `ProxyOptions`.
fn base() -> Figment {
    Figment::new()
}

pub fn load_from_env_or_file() -> Result<ProxyOptions> {
    let options: ProxyOptions = base()
        .merge(Toml::file("mitmproxy.toml"))
        .merge(Json::file("mitmproxy.json"))
        .merge(Yaml::file("mitmproxy.yaml"))
        .merge(Yaml::file("mitmproxy.yml"))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    options.validate()?;
    Ok(options)
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ProxyOptions> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::file_not_found("Configuration file", path));
    }

    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => base().merge(Toml::file(path)),
        Some("json") => base().merge(Json::file(path)),
        Some("yaml") | Some("yml") => base().merge(Yaml::file(path)),
        _ => {
            return Err(ConfigError::Parse(
                "Unsupported config file format. Use .toml, .json, .yaml, or .yml".into(),
            ))
        }
    };

    let options: ProxyOptions = figment
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    options.validate()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml() {
        let file = config_file(
            "toml",
            r#"
port = 9090
socks_proxy = true
ignore_hosts = ["^example\\.com:443$"]
ssl_version_server = "all"
"#,
        );
        let options = load_from_path(file.path()).unwrap();
        assert_eq!(options.port, 9090);
        assert!(options.socks_proxy);
        assert_eq!(options.ignore_hosts, vec![r"^example\.com:443$"]);
        assert_eq!(options.ssl_version_client, "secure");
        assert_eq!(options.ssl_version_server, "all");
        assert_eq!(options.ssl_ports, vec![443, 8443]);
    }

    #[test]
    fn test_load_yaml_and_json() {
        let yaml = config_file("yaml", "upstream_proxy: http://proxy:3128\nssl_ports: [9443]\n");
        let options = load_from_path(yaml.path()).unwrap();
        assert_eq!(options.upstream_proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(options.ssl_ports, vec![9443]);

        let json = config_file("json", r#"{"auth_nonanonymous": true}"#);
        assert!(load_from_path(json.path()).unwrap().auth_nonanonymous);
    }

    #[test]
    fn test_load_validates_exclusivity() {
        let file = config_file("toml", "transparent_proxy = true\nsocks_proxy = true\n");
        let err = load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MutuallyExclusive { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = config_file("ini", "port=1");
        assert!(matches!(
            load_from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_from_path("/no/such/mitmproxy.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
    }
}
