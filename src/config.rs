//! SDK configuration: credential, endpoint, and request timeout.
//!
//! Values are resolved from explicit arguments first, then process
//! environment variables, then a `.env` file discovered by walking parent
//! directories from the CWD. A `.env` file never overrides variables that
//! are already set.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Result, SdkError};

/// Environment variable carrying the bearer credential.
pub const ENV_API_KEY: &str = "AGENTBAY_API_KEY";
/// Environment variable overriding the control-plane endpoint.
pub const ENV_ENDPOINT: &str = "AGENTBAY_ENDPOINT";
/// Environment variable overriding the request timeout, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "AGENTBAY_TIMEOUT_MS";

const DEFAULT_ENDPOINT: &str = "wuyingai.cn-shanghai.aliyuncs.com";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Resolved SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bearer credential for the control plane.
    pub api_key: String,
    /// Control-plane endpoint, `host[:port]` or a full URL.
    pub endpoint: String,
    /// Per-request timeout applied to every control-plane call.
    pub timeout: Duration,
}

impl Config {
    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` if the credential is empty or the
    /// endpoint is empty or contains whitespace.
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let config = Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from `api_key` (if given), the process
    /// environment, and a discovered `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` if no credential can be found or an
    /// environment override fails to parse.
    pub fn load(api_key: Option<&str>) -> Result<Self> {
        load_env_file();

        let api_key = match api_key {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()).ok_or_else(|| {
                SdkError::Config(format!(
                    "api key not provided and {ENV_API_KEY} is not set"
                ))
            })?,
        };

        let endpoint = env::var(ENV_ENDPOINT)
            .ok()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());

        let timeout_ms = match env::var(ENV_TIMEOUT_MS) {
            Ok(raw) if !raw.is_empty() => raw.parse::<u64>().map_err(|err| {
                SdkError::Config(format!("invalid {ENV_TIMEOUT_MS} value '{raw}': {err}"))
            })?,
            _ => DEFAULT_TIMEOUT_MS,
        };

        Self::new(api_key, endpoint, Duration::from_millis(timeout_ms))
    }

    /// Base URL for control-plane requests.
    ///
    /// Endpoints without a scheme are assumed to be HTTPS hosts.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.trim_end_matches('/').to_owned()
        } else {
            format!("https://{}", self.endpoint)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(SdkError::Config("api key must not be empty".into()));
        }
        if self.endpoint.is_empty() || self.endpoint.chars().any(char::is_whitespace) {
            return Err(SdkError::Config(format!(
                "malformed endpoint '{}'",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Populate process env vars from a discovered `.env` file, if any.
///
/// Variables that are already set win; `dotenvy::from_path` only fills
/// gaps. Load errors are ignored so a malformed `.env` cannot break
/// construction.
fn load_env_file() {
    let Ok(cwd) = env::current_dir() else {
        return;
    };
    if let Some(path) = discover_env_file(&cwd) {
        let _ = dotenvy::from_path(path);
    }
}

/// Walk parent directories from `start` looking for a `.env` file.
///
/// The walk stops at the filesystem root or at a directory containing a
/// `.git` marker, so a repository can't pick up a `.env` from above its
/// own checkout.
fn discover_env_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(".env");
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").is_dir() {
            return None;
        }
        if !dir.pop() {
            return None;
        }
    }
}
