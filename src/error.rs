use std::path::PathBuf;
use thiserror::Error;

/// Every way option resolution can refuse to produce a [`ProxyConfig`].
///
/// [`ProxyConfig`]: crate::config::ProxyConfig
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} are mutually exclusive", .options.join(", "))]
    MutuallyExclusive { options: Vec<String> },

    #[error("{0} mode is not supported on this platform")]
    UnsupportedPlatform(String),

    #[error("Invalid {what}: {input}. {hint}")]
    InvalidFormat {
        what: &'static str,
        input: String,
        hint: &'static str,
    },

    #[error("Invalid SSL version: {0}")]
    InvalidTlsVersion(String),

    #[error("{what} does not exist: {}", .path.display())]
    FileNotFound { what: &'static str, path: PathBuf },

    #[error("{what} is not a directory: {}", .path.display())]
    NotADirectory { what: &'static str, path: PathBuf },

    #[error("{what} is not a file: {}", .path.display())]
    NotAFile { what: &'static str, path: PathBuf },

    #[error("{0}")]
    CredentialLoad(String),

    #[error("Invalid host pattern '{pattern}': {source}")]
    RegexCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to load certificate {}: {reason}", .path.display())]
    Certificate { path: PathBuf, reason: String },

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid_format(
        what: &'static str,
        input: impl Into<String>,
        hint: &'static str,
    ) -> Self {
        Self::InvalidFormat {
            what,
            input: input.into(),
            hint,
        }
    }

    pub fn file_not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound {
            what,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
