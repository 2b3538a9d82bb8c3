//! Connection routing modes
//!
//! Exactly one [`ProxyMode`] is active per configuration. Each variant knows
//! how request targets are framed on either side and carries whatever it
//! needs to find the real destination.

use crate::error::{ConfigError, Result};
use crate::non_empty;
use crate::platform::DestinationResolver;
use serde::Serialize;
use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::str::FromStr;
use std::sync::Arc;

/// How a request target is written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpForm {
    /// `GET /path HTTP/1.1`
    Relative,
    /// `GET http://host/path HTTP/1.1`
    Absolute,
    /// `CONNECT host:port HTTP/1.1`
    Authority,
}

impl HttpForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Authority => "authority",
        }
    }
}

impl FromStr for HttpForm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            "authority" => Ok(Self::Authority),
            other => Err(ConfigError::invalid_format(
                "HTTP form",
                other,
                "Expected one of relative, absolute, authority",
            )),
        }
    }
}

impl fmt::Display for HttpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpForms {
    pub form_in: HttpForm,
    pub form_out: HttpForm,
}

impl HttpForms {
    const fn new(form_in: HttpForm, form_out: HttpForm) -> Self {
        Self { form_in, form_out }
    }
}

/// An `http[s]://host[:port]` upstream address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSpec {
    pub tls: bool,
    pub host: String,
    pub port: u16,
}

impl ServerSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || {
            ConfigError::invalid_format(
                "server specification",
                spec,
                "Please use the format http[s]://host[:port]",
            )
        };

        let url = url::Url::parse(spec).map_err(|_| invalid())?;
        let tls = match url.scheme() {
            "http" => false,
            "https" => true,
            _ => return Err(invalid()),
        };
        if !matches!(url.path(), "" | "/")
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
        {
            return Err(invalid());
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(invalid)?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url.port_or_known_default().ok_or_else(invalid)?;

        Ok(Self { tls, host, port })
    }
}

impl fmt::Display for ServerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "https" } else { "http" };
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

/// Where an intercepted connection is really going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub addr: SocketAddr,
    pub tls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularMode {
    pub forms: HttpForms,
}

#[derive(Clone)]
pub struct TransparentMode {
    pub forms: HttpForms,
    pub resolver: Arc<dyn DestinationResolver>,
    pub ssl_ports: Vec<u16>,
}

impl TransparentMode {
    /// Ask the platform where `conn` was headed before it was redirected.
    pub fn original_destination(&self, conn: &TcpStream) -> io::Result<Destination> {
        let addr = self.resolver.original_addr(conn)?;
        Ok(Destination {
            addr,
            tls: self.ssl_ports.contains(&addr.port()),
        })
    }
}

impl fmt::Debug for TransparentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransparentMode")
            .field("forms", &self.forms)
            .field("ssl_ports", &self.ssl_ports)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socks5Mode {
    pub forms: HttpForms,
    pub ssl_ports: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseMode {
    pub forms: HttpForms,
    pub server: ServerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMode {
    pub forms: HttpForms,
    pub server: ServerSpec,
}

#[derive(Debug, Clone)]
pub enum ProxyMode {
    Regular(RegularMode),
    Transparent(TransparentMode),
    Socks5(Socks5Mode),
    Reverse(ReverseMode),
    Upstream(UpstreamMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Regular,
    Transparent,
    Socks5,
    Reverse,
    Upstream,
}

impl ModeKind {
    pub fn default_forms(&self) -> HttpForms {
        use HttpForm::*;
        match self {
            Self::Regular => HttpForms::new(Absolute, Relative),
            Self::Transparent => HttpForms::new(Relative, Relative),
            Self::Socks5 => HttpForms::new(Relative, Relative),
            Self::Reverse => HttpForms::new(Relative, Relative),
            Self::Upstream => HttpForms::new(Absolute, Absolute),
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Regular => "regular",
            Self::Transparent => "transparent",
            Self::Socks5 => "socks5",
            Self::Reverse => "reverse",
            Self::Upstream => "upstream",
        })
    }
}

impl ProxyMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Regular(_) => ModeKind::Regular,
            Self::Transparent(_) => ModeKind::Transparent,
            Self::Socks5(_) => ModeKind::Socks5,
            Self::Reverse(_) => ModeKind::Reverse,
            Self::Upstream(_) => ModeKind::Upstream,
        }
    }

    pub fn forms(&self) -> HttpForms {
        match self {
            Self::Regular(m) => m.forms,
            Self::Transparent(m) => m.forms,
            Self::Socks5(m) => m.forms,
            Self::Reverse(m) => m.forms,
            Self::Upstream(m) => m.forms,
        }
    }

    pub fn http_form_in(&self) -> HttpForm {
        self.forms().form_in
    }

    pub fn http_form_out(&self) -> HttpForm {
        self.forms().form_out
    }

    /// The fixed upstream for reverse and upstream modes.
    pub fn server(&self) -> Option<&ServerSpec> {
        match self {
            Self::Reverse(m) => Some(&m.server),
            Self::Upstream(m) => Some(&m.server),
            _ => None,
        }
    }
}

/// Raw routing intents before validation.
#[derive(Debug, Clone, Default)]
pub struct ModeOptions {
    pub transparent: bool,
    pub socks5: bool,
    pub reverse: Option<String>,
    pub upstream: Option<String>,
    pub http_form_in: Option<String>,
    pub http_form_out: Option<String>,
    pub ssl_ports: Vec<u16>,
}

impl ModeOptions {
    /// Names of the routing flags that were set, in a fixed order.
    pub fn requested(&self) -> Vec<&'static str> {
        let mut requested = Vec::new();
        if self.transparent {
            requested.push("--transparent");
        }
        if self.socks5 {
            requested.push("--socks");
        }
        if self.reverse_target().is_some() {
            requested.push("--reverse");
        }
        if self.upstream_target().is_some() {
            requested.push("--upstream");
        }
        requested
    }

    /// The reverse proxy target, if one was given. An empty string counts as unset.
    pub fn reverse_target(&self) -> Option<&str> {
        non_empty(&self.reverse)
    }

    /// The upstream proxy, if one was given. An empty string counts as unset.
    pub fn upstream_target(&self) -> Option<&str> {
        non_empty(&self.upstream)
    }
}

fn parse_form_override(raw: &Option<String>) -> Result<Option<HttpForm>> {
    non_empty(raw).map(str::parse).transpose()
}

/// Select the routing mode, failing if more than one was requested.
///
/// `resolver` is the platform capability transparent mode depends on;
/// pass [`crate::platform::resolver()`] outside of tests.
pub fn resolve_mode(
    options: &ModeOptions,
    resolver: Option<Arc<dyn DestinationResolver>>,
) -> Result<ProxyMode> {
    let requested = options.requested();
    if requested.len() > 1 {
        return Err(ConfigError::MutuallyExclusive {
            options: requested.into_iter().map(String::from).collect(),
        });
    }

    let form_in = parse_form_override(&options.http_form_in)?;
    let form_out = parse_form_override(&options.http_form_out)?;

    let kind = if options.transparent {
        ModeKind::Transparent
    } else if options.socks5 {
        ModeKind::Socks5
    } else if options.reverse_target().is_some() {
        ModeKind::Reverse
    } else if options.upstream_target().is_some() {
        ModeKind::Upstream
    } else {
        ModeKind::Regular
    };

    let defaults = kind.default_forms();
    let forms = HttpForms {
        form_in: form_in.unwrap_or(defaults.form_in),
        form_out: form_out.unwrap_or(defaults.form_out),
    };

    let mode = match kind {
        ModeKind::Regular => ProxyMode::Regular(RegularMode { forms }),
        ModeKind::Transparent => {
            let resolver = resolver
                .ok_or_else(|| ConfigError::UnsupportedPlatform("Transparent".to_string()))?;
            ProxyMode::Transparent(TransparentMode {
                forms,
                resolver,
                ssl_ports: options.ssl_ports.clone(),
            })
        }
        ModeKind::Socks5 => ProxyMode::Socks5(Socks5Mode {
            forms,
            ssl_ports: options.ssl_ports.clone(),
        }),
        ModeKind::Reverse => ProxyMode::Reverse(ReverseMode {
            forms,
            server: ServerSpec::parse(options.reverse_target().unwrap_or_default())?,
        }),
        ModeKind::Upstream => ProxyMode::Upstream(UpstreamMode {
            forms,
            server: ServerSpec::parse(options.upstream_target().unwrap_or_default())?,
        }),
    };

    tracing::info!(
        mode = %kind,
        http_form_in = %forms.form_in,
        http_form_out = %forms.form_out,
        server = ?mode.server().map(ToString::to_string),
        "Selected proxy mode"
    );
    Ok(mode)
}
