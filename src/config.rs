//! Client configuration.
//!
//! Settings are resolved in priority order:
//! 1. `--base-url` / `--timeout-ms` CLI flags
//! 2. `POLICYVIEW_BASE_URL` / `POLICYVIEW_TIMEOUT_MS` environment variables
//! 3. a JSON config file (`--config`, or `<config_dir>/policyview/config.json`)
//! 4. built-in defaults
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const BASE_URL_ENV: &str = "POLICYVIEW_BASE_URL";
pub const TIMEOUT_ENV: &str = "POLICYVIEW_TIMEOUT_MS";

/// Connection settings for the compliance API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Explicit overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Default config file location under the user's config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("policyview").join("config.json"))
}

/// Load a config file.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ClientConfig =
        serde_json::from_slice(&bytes).context("parse policyview config JSON")?;
    Ok(config)
}

/// Resolve the effective config from file, environment, and overrides.
///
/// `env` is a lookup so callers (and tests) control the environment.
pub fn resolve_config(
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let mut config = match &overrides.config_path {
        Some(path) => load_config(path)?,
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => load_config(&path)?,
            None => ClientConfig::default(),
        },
    };

    if let Some(base_url) = env(BASE_URL_ENV) {
        config.base_url = base_url;
    }
    if let Some(raw) = env(TIMEOUT_ENV) {
        config.timeout_ms = raw
            .trim()
            .parse()
            .with_context(|| format!("parse {TIMEOUT_ENV}={raw:?}"))?;
    }
    if let Some(base_url) = &overrides.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
    validate_config(&config)?;
    Ok(config)
}

/// Validate a resolved config.
pub fn validate_config(config: &ClientConfig) -> Result<()> {
    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        return Err(anyhow!(
            "base_url must start with http:// or https:// (got {:?})",
            config.base_url
        ));
    }
    if config.timeout_ms == 0 {
        return Err(anyhow!("timeout_ms must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
