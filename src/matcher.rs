//! Host matching for interception bypass
//!
//! Patterns are regular expressions searched (not anchored) against
//! `"host:port"`, case-insensitively. Callers escape literal dots themselves.

use crate::error::{ConfigError, Result};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Default)]
pub struct HostMatcher {
    patterns: Vec<String>,
    regexes: Vec<Regex>,
}

impl HostMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let regexes = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::RegexCompile {
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns, regexes })
    }

    pub fn matches(&self, host: &str, port: u16) -> bool {
        if self.regexes.is_empty() {
            return false;
        }
        let address = format!("{}:{}", host, port);
        self.regexes.iter().any(|re| re.is_match(&address))
    }

    /// Whether any pattern is configured at all.
    pub fn is_active(&self) -> bool {
        !self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
