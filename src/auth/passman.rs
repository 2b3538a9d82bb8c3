//! Password managers backing HTTP Basic proxy authentication

use crate::error::{ConfigError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub trait PasswordManager: Send + Sync + fmt::Debug {
    fn test(&self, username: &str, password: &str) -> bool;
}

/// Accepts any request that names a user.
#[derive(Debug, Default)]
pub struct PassManNonAnon;

impl PasswordManager for PassManNonAnon {
    fn test(&self, username: &str, _password: &str) -> bool {
        !username.is_empty()
    }
}

pub struct PassManSingleUser {
    username: String,
    password: String,
}

impl PassManSingleUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse `username:password`; exactly one `:` is allowed.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        match parts.as_slice() {
            [username, password] => Ok(Self::new(*username, *password)),
            _ => Err(ConfigError::invalid_format(
                "single-user specification",
                spec,
                "Please use the format username:password",
            )),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for PassManSingleUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManSingleUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl PasswordManager for PassManSingleUser {
    fn test(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Hash schemes an htpasswd entry may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HtpasswdScheme {
    /// `$apr1$salt$hash`, the `htpasswd` default
    Apr1,
    /// `$2a$`, `$2b$` or `$2y$`
    Bcrypt,
    /// `{SHA}` followed by base64(SHA-1(password))
    Sha1,
    /// 13 character DES crypt
    Crypt,
    Plain,
}

impl HtpasswdScheme {
    fn detect(hash: &str) -> std::result::Result<Self, String> {
        if let Some(encoded) = hash.strip_prefix("{SHA}") {
            let digest = STANDARD
                .decode(encoded)
                .map_err(|e| format!("invalid {{SHA}} digest: {}", e))?;
            if digest.len() != 20 {
                return Err("invalid {SHA} digest length".to_string());
            }
            return Ok(Self::Sha1);
        }
        if let Some(rest) = hash.strip_prefix('$') {
            return match rest.split('$').next().unwrap_or_default() {
                "apr1" => Ok(Self::Apr1),
                "2a" | "2b" | "2y" => Ok(Self::Bcrypt),
                scheme => Err(format!("unsupported hash scheme ${}$", scheme)),
            };
        }
        let is_crypt = hash.len() == 13
            && hash
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'/');
        Ok(if is_crypt { Self::Crypt } else { Self::Plain })
    }
}

struct HtpasswdEntry {
    scheme: HtpasswdScheme,
    /// The whole `user:hash` line, handed to the verifier as is.
    line: String,
    hash: String,
}

impl HtpasswdEntry {
    fn verify(&self, username: &str, password: &str) -> bool {
        match self.scheme {
            HtpasswdScheme::Plain => self.hash == password,
            _ => htpasswd_verify::Htpasswd::from(self.line.as_str()).check(username, password),
        }
    }
}

/// Credentials loaded from an Apache htpasswd file.
///
/// Supported entries are `$apr1$` MD5, bcrypt, `{SHA}`, DES crypt and
/// plaintext passwords.
pub struct PassManHtpasswd {
    path: PathBuf,
    users: HashMap<String, HtpasswdEntry>,
}

impl PassManHtpasswd {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found("htpasswd file", path));
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                what: "htpasswd file",
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::CredentialLoad(format!(
                "Could not read htpasswd file {}: {}",
                path.display(),
                e
            ))
        })?;
        let users = Self::parse(&content).map_err(ConfigError::CredentialLoad)?;

        tracing::debug!(path = %path.display(), users = users.len(), "Loaded htpasswd file");
        Ok(Self {
            path: path.to_path_buf(),
            users,
        })
    }

    fn parse(content: &str) -> std::result::Result<HashMap<String, HtpasswdEntry>, String> {
        let mut users = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (user, hash) = line
                .split_once(':')
                .filter(|(user, _)| !user.is_empty())
                .ok_or_else(|| format!("Malformed htpasswd file at line {}", idx + 1))?;
            let scheme = HtpasswdScheme::detect(hash)
                .map_err(|e| format!("Malformed htpasswd file at line {}: {}", idx + 1, e))?;
            users.insert(
                user.to_string(),
                HtpasswdEntry {
                    scheme,
                    line: line.to_string(),
                    hash: hash.to_string(),
                },
            );
        }
        Ok(users)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl fmt::Debug for PassManHtpasswd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManHtpasswd")
            .field("path", &self.path)
            .field("users", &self.users.len())
            .finish()
    }
}

impl PasswordManager for PassManHtpasswd {
    fn test(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|entry| entry.verify(username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    // "test" hashed with `htpasswd -s`
    const TEST_SHA: &str = "{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=";

    fn htpasswd(content: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_non_anonymous() {
        let pm = PassManNonAnon;
        assert!(pm.test("anyone", ""));
        assert!(!pm.test("", "password"));
    }

    #[test]
    fn test_single_user() {
        let pm = PassManSingleUser::from_spec("alice:wonderland").unwrap();
        assert_eq!(pm.username(), "alice");
        assert!(pm.test("alice", "wonderland"));
        assert!(!pm.test("alice", "looking-glass"));
        assert!(!pm.test("bob", "wonderland"));
        assert!(!format!("{:?}", pm).contains("wonderland"));
    }

    #[test]
    fn test_single_user_spec_needs_exactly_one_colon() {
        for spec in ["alice", "alice:wonder:land", ""] {
            let err = PassManSingleUser::from_spec(spec).unwrap_err();
            assert!(
                err.to_string().contains("username:password"),
                "spec {:?}: {}",
                spec,
                err
            );
        }
    }

    #[test]
    fn test_single_user_empty_parts_are_allowed() {
        let pm = PassManSingleUser::from_spec(":").unwrap();
        assert!(pm.test("", ""));
    }

    #[test]
    fn test_htpasswd_sha_and_plain() {
        let file = htpasswd(&format!(
            "# users\n\ntest:{}\nplain:secret\n",
            TEST_SHA
        ));
        let pm = PassManHtpasswd::from_file(file.path()).unwrap();
        assert_eq!(pm.len(), 2);
        assert!(pm.test("test", "test"));
        assert!(!pm.test("test", "nope"));
        assert!(pm.test("plain", "secret"));
        assert!(!pm.test("nobody", "test"));
    }

    #[test]
    fn test_htpasswd_malformed_line() {
        let file = htpasswd("test:{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=\ngarbage\n");
        let err = PassManHtpasswd::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::CredentialLoad(msg) => {
                assert_eq!(msg, "Malformed htpasswd file at line 2")
            }
            other => panic!("Expected CredentialLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_htpasswd_apr1_and_crypt() {
        // `openssl passwd -apr1 -salt mI4F0A9A test` and DES crypt of "test" with salt "ab"
        let file = htpasswd("apache:$apr1$mI4F0A9A$Q67zannGd/3EVGHqM.pJN1\nlegacy:abgOeLfPimXQo\n");
        let pm = PassManHtpasswd::from_file(file.path()).unwrap();
        assert_eq!(pm.len(), 2);
        assert!(pm.test("apache", "test"));
        assert!(!pm.test("apache", "secret"));
        assert!(pm.test("legacy", "test"));
        assert!(!pm.test("legacy", "nope"));
    }

    #[test]
    fn test_htpasswd_scheme_detection() {
        use HtpasswdScheme::*;
        assert_eq!(HtpasswdScheme::detect("$apr1$salt$hash"), Ok(Apr1));
        assert_eq!(
            HtpasswdScheme::detect("$2y$05$nC6nErr9XZJuMJ57WyCob.EuZEjylDt2KaHfbfOtyb.EgL1I2jCVa"),
            Ok(Bcrypt)
        );
        assert_eq!(HtpasswdScheme::detect(TEST_SHA), Ok(Sha1));
        assert_eq!(HtpasswdScheme::detect("abgOeLfPimXQo"), Ok(Crypt));
        assert_eq!(HtpasswdScheme::detect("secret"), Ok(Plain));
        assert_eq!(
            HtpasswdScheme::detect("$6$rounds$hash"),
            Err("unsupported hash scheme $6$".to_string())
        );
    }

    #[test]
    fn test_htpasswd_unsupported_scheme_names_line() {
        let file = htpasswd("ok:secret\nshadow:$6$salt$hash\n");
        let err = PassManHtpasswd::from_file(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed htpasswd file at line 2: unsupported hash scheme $6$"
        );
    }

    #[test]
    fn test_htpasswd_directory_is_not_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = PassManHtpasswd::from_file(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile { .. }));
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_htpasswd_missing_file() {
        let err = PassManHtpasswd::from_file("/no/such/.htpasswd").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        assert!(err.to_string().contains("/no/such/.htpasswd"));
    }
}
