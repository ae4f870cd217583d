//! Console configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use super::storage::FileStorage;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Console configuration loaded from environment
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the remote admin API
    pub api_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Location of the persisted session file
    pub storage_path: PathBuf,
    /// Tell the remote API about logouts
    pub notify_logout: bool,
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Only a malformed `FIXDESK_API_URL` is an error; other invalid values
    /// fall back to their defaults with a warning.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("FIXDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url).context("FIXDESK_API_URL must be an absolute URL")?;

        let timeout_ms = parse_or(&lookup, "FIXDESK_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS);

        Ok(Self {
            api_url,
            request_timeout: Duration::from_millis(timeout_ms),
            storage_path: lookup("FIXDESK_STORAGE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(FileStorage::default_path),
            notify_logout: parse_or(&lookup, "FIXDESK_NOTIFY_LOGOUT", false),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
    }
}
