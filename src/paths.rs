use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// Anything else (including `~otheruser/...`) is returned unchanged.
pub fn expand_user(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir().ok_or(ConfigError::NoHomeDir);
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// Expand `~` and anchor relative paths at the current working directory.
pub fn absolute(path: &str) -> Result<PathBuf> {
    let expanded = expand_user(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}

pub fn require_dir(what: &'static str, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ConfigError::file_not_found(what, path));
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
