//! Certificate store ingestion
//!
//! The store only indexes existing PEM material. Minting leaf certificates
//! for domains without an entry belongs to the TLS engine.

use crate::certs::CertSpec;
use crate::error::{ConfigError, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A PEM chain (leaf first) with its private key, if the file carried one.
#[derive(Debug)]
pub struct CertEntry {
    pub domain: String,
    pub path: PathBuf,
    pub chain: Vec<CertificateDer<'static>>,
    pub key: Option<PrivateKeyDer<'static>>,
}

impl CertEntry {
    fn load(domain: &str, path: &Path) -> Result<Self> {
        let cert_error = |reason: String| ConfigError::Certificate {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = BufReader::new(File::open(path)?);
        let chain = rustls_pemfile::certs(&mut reader)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| cert_error(e.to_string()))?;
        if chain.is_empty() {
            return Err(cert_error("no PEM certificate found".to_string()));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let key = rustls_pemfile::private_key(&mut reader).map_err(|e| cert_error(e.to_string()))?;

        Ok(Self {
            domain: domain.to_ascii_lowercase(),
            path: path.to_path_buf(),
            chain,
            key,
        })
    }

    pub fn leaf(&self) -> &CertificateDer<'static> {
        &self.chain[0]
    }
}

#[derive(Debug)]
pub struct CertStore {
    cadir: PathBuf,
    basename: String,
    ca: Option<CertEntry>,
    entries: Vec<CertEntry>,
}

impl CertStore {
    /// Open the store rooted at `cadir`, picking up `<basename>-ca.pem` if present.
    pub fn from_store(cadir: impl Into<PathBuf>, basename: &str) -> Result<Self> {
        let cadir = cadir.into();
        let ca_path = cadir.join(format!("{}-ca.pem", basename));
        let ca = if ca_path.is_file() {
            tracing::debug!(path = %ca_path.display(), "Loading CA certificate");
            Some(CertEntry::load("*", &ca_path)?)
        } else {
            tracing::debug!(
                path = %ca_path.display(),
                "No CA certificate on disk, leaving generation to the TLS engine"
            );
            None
        };

        Ok(Self {
            cadir,
            basename: basename.to_string(),
            ca,
            entries: Vec::new(),
        })
    }

    pub fn add_cert_file(&mut self, domain: &str, path: &Path) -> Result<()> {
        let entry = CertEntry::load(domain, path)?;
        tracing::debug!(
            domain = domain,
            path = %path.display(),
            chain_len = entry.chain.len(),
            has_key = entry.key.is_some(),
            "Added certificate to store"
        );
        self.entries.push(entry);
        Ok(())
    }

    pub fn add_specs(&mut self, specs: &[CertSpec]) -> Result<()> {
        for spec in specs {
            self.add_cert_file(&spec.domain, &spec.path)?;
        }
        Ok(())
    }

    /// Find the certificate serving `domain`.
    ///
    /// Exact patterns win over wildcards, narrower wildcards over broader
    /// ones, and `*` is the last resort. Among identical patterns the entry
    /// added first wins.
    pub fn get_cert(&self, domain: &str) -> Option<&CertEntry> {
        let domain = domain.to_ascii_lowercase();
        lookup_forms(&domain)
            .into_iter()
            .find_map(|form| self.entries.iter().find(|e| e.domain == form))
    }

    pub fn ca(&self) -> Option<&CertEntry> {
        self.ca.as_ref()
    }

    pub fn cadir(&self) -> &Path {
        &self.cadir
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn entries(&self) -> &[CertEntry] {
        &self.entries
    }
}

/// `a.b.example.com` → `a.b.example.com`, `*.b.example.com`, `*.example.com`, `*.com`, `*`
fn lookup_forms(domain: &str) -> Vec<String> {
    let mut forms = vec![domain.to_string()];
    let mut rest = domain;
    while let Some((_, parent)) = rest.split_once('.') {
        forms.push(format!("*.{}", parent));
        rest = parent;
    }
    forms.push("*".to_string());
    forms
}
