use crate::error::{ConfigError, Result};
use crate::paths::expand_user;
use std::path::PathBuf;

/// A domain pattern paired with the PEM file that should serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertSpec {
    pub domain: String,
    pub path: PathBuf,
}

impl CertSpec {
    /// Parse `[domain=]path`, splitting on the first `=` only.
    pub fn parse(raw: &str) -> Result<Self> {
        let (domain, path) = match raw.split_once('=') {
            Some((domain, path)) => (domain, path),
            None => ("*", raw),
        };
        if domain.is_empty() || path.is_empty() {
            return Err(ConfigError::invalid_format(
                "certificate specification",
                raw,
                "Please use the format [domain=]path",
            ));
        }

        Ok(Self {
            domain: domain.to_string(),
            path: expand_user(path)?,
        })
    }
}

/// Parse and check every spec, keeping input order and duplicates.
pub fn load_cert_specs<S: AsRef<str>>(raw_specs: &[S]) -> Result<Vec<CertSpec>> {
    raw_specs
        .iter()
        .map(|raw| {
            let spec = CertSpec::parse(raw.as_ref())?;
            if !spec.path.exists() {
                return Err(ConfigError::file_not_found("Certificate file", spec.path));
            }
            Ok(spec)
        })
        .collect()
}
