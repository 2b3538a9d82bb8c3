use crate::error::ConfigError;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Symbolic SSL/TLS version labels accepted on either side of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsVersion {
    /// Every version the library can negotiate, SSLv2 and SSLv3 included
    All,
    /// TLS 1.0 and later
    Secure,
    SslV2,
    SslV3,
    TlsV1,
    TlsV1_1,
    TlsV1_2,
}

impl TlsVersion {
    pub const CHOICES: [&'static str; 7] = [
        "all", "secure", "SSLv2", "SSLv3", "TLSv1", "TLSv1_1", "TLSv1_2",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Secure => "secure",
            Self::SslV2 => "SSLv2",
            Self::SslV3 => "SSLv3",
            Self::TlsV1 => "TLSv1",
            Self::TlsV1_1 => "TLSv1_1",
            Self::TlsV1_2 => "TLSv1_2",
        }
    }

    /// Whether this label permits SSLv2 or SSLv3 handshakes.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::All | Self::SslV2 | Self::SslV3)
    }
}

impl FromStr for TlsVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "secure" => Ok(Self::Secure),
            "SSLv2" => Ok(Self::SslV2),
            "SSLv3" => Ok(Self::SslV3),
            "TLSv1" => Ok(Self::TlsV1),
            "TLSv1_1" => Ok(Self::TlsV1_1),
            "TLSv1_2" => Ok(Self::TlsV1_2),
            other => Err(ConfigError::InvalidTlsVersion(other.to_string())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol method selector, one per constructor the TLS library exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsMethod {
    /// The broadest negotiable method (OpenSSL's `SSLv23_METHOD`)
    Negotiate,
    SslV2,
    SslV3,
    TlsV1,
    TlsV1_1,
    TlsV1_2,
}

/// Bitmask of protocol versions disabled on top of a [`TlsMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TlsOptions(u64);

impl TlsOptions {
    pub const NO_SSLV2: Self = Self(0x0100_0000);
    pub const NO_SSLV3: Self = Self(0x0200_0000);

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TlsOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Resolved protocol policy for one side of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsPolicy {
    pub method: TlsMethod,
    pub options: Option<TlsOptions>,
}

impl TlsPolicy {
    /// The library only offers one "broadest" method plus a disable mask, so
    /// TLS 1.0+ is expressed as broadest minus SSLv2 minus SSLv3.
    pub fn resolve(version: TlsVersion) -> Self {
        let (method, options) = match version {
            TlsVersion::All => (TlsMethod::Negotiate, None),
            TlsVersion::Secure => (
                TlsMethod::Negotiate,
                Some(TlsOptions::NO_SSLV2 | TlsOptions::NO_SSLV3),
            ),
            TlsVersion::SslV2 => (TlsMethod::SslV2, None),
            TlsVersion::SslV3 => (TlsMethod::SslV3, None),
            TlsVersion::TlsV1 => (TlsMethod::TlsV1, None),
            TlsVersion::TlsV1_1 => (TlsMethod::TlsV1_1, None),
            TlsVersion::TlsV1_2 => (TlsMethod::TlsV1_2, None),
        };
        Self { method, options }
    }

    pub fn from_label(label: &str) -> Result<Self, ConfigError> {
        label.parse().map(Self::resolve)
    }

    pub fn disables(&self, option: TlsOptions) -> bool {
        self.options.is_some_and(|o| o.contains(option))
    }

    /// Project this policy onto the versions rustls can actually speak.
    ///
    /// rustls implements TLS 1.2 and 1.3 only, so policies pinned to older
    /// protocols come back empty.
    pub fn rustls_versions(&self) -> Vec<&'static rustls::SupportedProtocolVersion> {
        match self.method {
            TlsMethod::Negotiate => rustls::ALL_VERSIONS.to_vec(),
            TlsMethod::TlsV1_2 => vec![&rustls::version::TLS12],
            TlsMethod::SslV2 | TlsMethod::SslV3 | TlsMethod::TlsV1 | TlsMethod::TlsV1_1 => {
                Vec::new()
            }
        }
    }
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self::resolve(TlsVersion::Secure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_choice_round_trips() {
        for label in TlsVersion::CHOICES {
            let version: TlsVersion = label.parse().unwrap();
            assert_eq!(version.as_str(), label);
        }
    }

    #[test]
    fn test_all_disables_nothing() {
        let policy = TlsPolicy::from_label("all").unwrap();
        assert_eq!(policy.method, TlsMethod::Negotiate);
        assert_eq!(policy.options, None);
    }

    #[test]
    fn test_secure_disables_ssl() {
        let policy = TlsPolicy::from_label("secure").unwrap();
        assert_eq!(policy.method, TlsMethod::Negotiate);
        assert!(policy.disables(TlsOptions::NO_SSLV2));
        assert!(policy.disables(TlsOptions::NO_SSLV3));
        assert_eq!(policy.options.unwrap().bits(), 0x0300_0000);
        assert_eq!(policy, TlsPolicy::default());
    }

    #[test]
    fn test_named_versions_have_dedicated_methods() {
        let cases = [
            ("SSLv2", TlsMethod::SslV2),
            ("SSLv3", TlsMethod::SslV3),
            ("TLSv1", TlsMethod::TlsV1),
            ("TLSv1_1", TlsMethod::TlsV1_1),
            ("TLSv1_2", TlsMethod::TlsV1_2),
        ];
        for (label, method) in cases {
            let policy = TlsPolicy::from_label(label).unwrap();
            assert_eq!(policy.method, method, "label {}", label);
            assert_eq!(policy.options, None, "label {}", label);
        }
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert!(TlsPolicy::from_label("tlsv1_2").is_err());
        assert!(TlsPolicy::from_label("SECURE").is_err());
    }

    #[test]
    fn test_bogus_label() {
        let err = TlsPolicy::from_label("bogus").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTlsVersion(ref s) if s == "bogus"));
        assert_eq!(err.to_string(), "Invalid SSL version: bogus");
    }

    #[test]
    fn test_insecure_labels() {
        assert!(TlsVersion::All.is_insecure());
        assert!(TlsVersion::SslV3.is_insecure());
        assert!(!TlsVersion::Secure.is_insecure());
        assert!(!TlsVersion::TlsV1_2.is_insecure());
    }

    #[test]
    fn test_rustls_projection() {
        let secure = TlsPolicy::from_label("secure").unwrap();
        assert_eq!(secure.rustls_versions().len(), rustls::ALL_VERSIONS.len());

        let tls12 = TlsPolicy::from_label("TLSv1_2").unwrap();
        let versions = tls12.rustls_versions();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, rustls::ProtocolVersion::TLSv1_2);

        assert!(TlsPolicy::from_label("SSLv3")
            .unwrap()
            .rustls_versions()
            .is_empty());
    }
}
