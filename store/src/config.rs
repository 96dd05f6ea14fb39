//! Backing-store configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::StoreError;

pub const DEFAULT_LOCAL_DIR: &str = "data/local";
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Which adapter backs the collection store in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub local_dir: PathBuf,
    pub remote_url: String,
    pub timeouts: Timeouts,
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Optional:
    /// - `HERITAGE_BACKEND`: `local` (default) or `remote`
    /// - `HERITAGE_LOCAL_DIR`: directory for local entries (default `data/local`)
    /// - `HERITAGE_REMOTE_URL`: file-store base URL (default `http://localhost:3001`)
    /// - `HERITAGE_REQUEST_TIMEOUT_SECS`: default 10
    /// - `HERITAGE_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if `HERITAGE_BACKEND` names an unknown adapter.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if `HERITAGE_BACKEND` names an unknown adapter.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let backend = parse_backend(lookup("HERITAGE_BACKEND").as_deref())?;
        let local_dir = lookup("HERITAGE_LOCAL_DIR").map_or_else(|| PathBuf::from(DEFAULT_LOCAL_DIR), PathBuf::from);
        let remote_url = normalize_base_url(&lookup("HERITAGE_REMOTE_URL").unwrap_or_else(|| DEFAULT_REMOTE_URL.into()));
        let timeouts = Timeouts {
            request_secs: parse_or(lookup("HERITAGE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("HERITAGE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { backend, local_dir, remote_url, timeouts })
    }
}

fn parse_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}

/// Parse an adapter name; `None` selects the local adapter.
///
/// # Errors
///
/// Returns an error for anything other than `local` or `remote`.
pub fn parse_backend(raw: Option<&str>) -> Result<BackendKind, StoreError> {
    match raw.unwrap_or("local") {
        "local" => Ok(BackendKind::Local),
        "remote" => Ok(BackendKind::Remote),
        other => Err(StoreError::ConfigParse(format!(
            "unknown HERITAGE_BACKEND '{other}' (expected 'local' or 'remote')"
        ))),
    }
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
