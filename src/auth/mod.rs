//! Proxy authentication backends
//!
//! Every backend is presented through [`Authenticator`] so the connection
//! handlers never care which flag selected it.

pub mod passman;

use crate::error::{ConfigError, Result};
use crate::non_empty;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{HeaderMap, HeaderValue, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use passman::{
    PassManHtpasswd, PassManNonAnon, PassManSingleUser, PasswordManager,
};

pub const DEFAULT_REALM: &str = "mitmproxy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackend {
    Null,
    NonAnonymous,
    SingleUser,
    Htpasswd,
}

impl fmt::Display for AuthBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "none",
            Self::NonAnonymous => "nonanonymous",
            Self::SingleUser => "singleuser",
            Self::Htpasswd => "htpasswd",
        })
    }
}

pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Verify the credentials carried by a request's headers.
    fn authenticate(&self, headers: &HeaderMap) -> bool;

    /// Headers to send with a 407 when [`authenticate`](Self::authenticate) fails.
    fn challenge_headers(&self) -> HeaderMap;

    /// Strip credentials before the request goes upstream.
    fn clean(&self, headers: &mut HeaderMap);

    fn backend(&self) -> AuthBackend;
}

/// Lets every request through.
#[derive(Debug, Default)]
pub struct NullProxyAuth;

impl Authenticator for NullProxyAuth {
    fn authenticate(&self, _headers: &HeaderMap) -> bool {
        true
    }

    fn challenge_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    fn clean(&self, _headers: &mut HeaderMap) {}

    fn backend(&self) -> AuthBackend {
        AuthBackend::Null
    }
}

#[derive(Debug)]
pub struct BasicProxyAuth {
    manager: Box<dyn PasswordManager>,
    backend: AuthBackend,
    challenge: HeaderValue,
}

impl BasicProxyAuth {
    pub fn new(
        manager: Box<dyn PasswordManager>,
        backend: AuthBackend,
        realm: &str,
    ) -> Result<Self> {
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
            .map_err(|_| {
                ConfigError::invalid_format(
                    "authentication realm",
                    realm,
                    "The realm must be a valid header value",
                )
            })?;
        Ok(Self {
            manager,
            backend,
            challenge,
        })
    }
}

impl Authenticator for BasicProxyAuth {
    fn authenticate(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(PROXY_AUTHORIZATION) else {
            return false;
        };
        let Ok(value) = value.to_str() else {
            return false;
        };
        match parse_basic_auth(value) {
            Some((username, password)) => self.manager.test(&username, &password),
            None => false,
        }
    }

    fn challenge_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_AUTHENTICATE, self.challenge.clone());
        headers
    }

    fn clean(&self, headers: &mut HeaderMap) {
        headers.remove(PROXY_AUTHORIZATION);
    }

    fn backend(&self) -> AuthBackend {
        self.backend
    }
}

/// Decode `Basic base64(user:pass)` into its two halves.
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let encoded = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Raw authentication flags.
#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    pub nonanonymous: bool,
    pub singleuser: Option<String>,
    pub htpasswd: Option<String>,
}

impl AuthOptions {
    /// Names of the flags that were set, in a fixed order.
    pub fn requested(&self) -> Vec<&'static str> {
        let mut requested = Vec::new();
        if self.nonanonymous {
            requested.push("--nonanonymous");
        }
        if self.singleuser_spec().is_some() {
            requested.push("--singleuser");
        }
        if self.htpasswd_path().is_some() {
            requested.push("--htpasswd");
        }
        requested
    }

    /// The `username:password` spec, if one was given. An empty string counts as unset.
    pub fn singleuser_spec(&self) -> Option<&str> {
        non_empty(&self.singleuser)
    }

    /// The htpasswd path, if one was given. An empty string counts as unset.
    pub fn htpasswd_path(&self) -> Option<&str> {
        non_empty(&self.htpasswd)
    }
}

/// Pick the authentication backend.
///
/// Exclusivity is checked by the caller; here the first set flag wins, in the
/// order singleuser, nonanonymous, htpasswd.
pub fn select_authenticator(options: &AuthOptions) -> Result<Arc<dyn Authenticator>> {
    let (manager, backend): (Box<dyn PasswordManager>, AuthBackend) =
        if let Some(spec) = options.singleuser_spec() {
            (
                Box::new(PassManSingleUser::from_spec(spec)?),
                AuthBackend::SingleUser,
            )
        } else if options.nonanonymous {
            (Box::new(PassManNonAnon), AuthBackend::NonAnonymous)
        } else if let Some(path) = options.htpasswd_path() {
            let path = crate::paths::expand_user(path)?;
            (
                Box::new(PassManHtpasswd::from_file(path)?),
                AuthBackend::Htpasswd,
            )
        } else {
            tracing::info!(backend = %AuthBackend::Null, "Proxy authentication disabled");
            return Ok(Arc::new(NullProxyAuth));
        };

    tracing::info!(backend = %backend, realm = DEFAULT_REALM, "Proxy authentication enabled");
    Ok(Arc::new(BasicProxyAuth::new(manager, backend, DEFAULT_REALM)?))
}
