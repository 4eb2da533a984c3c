//! Client configuration and layered loading.
//!
//! Resolution order for every field: explicit [`Config`] values, then process
//! environment variables, then an optional `.env` dotfile found by walking up
//! from the working directory, then built-in defaults.

use std::env;
use std::path::Path;
use std::path::PathBuf;

/// Environment variable for the API key fallback.
pub const API_KEY_ENV: &str = "AGENTBAY_API_KEY";

const REGION_ID_ENV: &str = "AGENTBAY_REGION_ID";
const ENDPOINT_ENV: &str = "AGENTBAY_ENDPOINT";
const TIMEOUT_MS_ENV: &str = "AGENTBAY_TIMEOUT_MS";

/// Configuration for the AgentBay control-plane client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Region passed to the control plane as `LoginRegionId`.
    pub region_id: String,
    /// Control-plane host, without scheme.
    pub endpoint: String,
    /// Read and connect timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Config {
    /// Default control-plane region.
    pub const DEFAULT_REGION_ID: &'static str = "cn-shanghai";

    /// Default control-plane endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "wuyingai.cn-shanghai.aliyuncs.com";

    /// Default request timeout (60 s).
    pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

    /// Create a configuration with explicit values.
    pub fn new(
        region_id: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            region_id: region_id.into(),
            endpoint: endpoint.into(),
            timeout_ms,
        }
    }

    /// Set the region id.
    pub fn region_id(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = region_id.into();
        self
    }

    /// Set the endpoint host.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout in milliseconds.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region_id: Self::DEFAULT_REGION_ID.to_string(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Resolve the effective configuration.
///
/// `explicit` wins over everything; otherwise values come from the process
/// environment, then from `env_file` (or the nearest `.env` walking up from
/// the current directory), then from the built-in defaults.
pub fn load_config(explicit: Option<Config>, env_file: Option<&Path>) -> Config {
    if let Some(cfg) = explicit {
        return cfg;
    }

    let dotfile = read_dotfile(env_file);

    let lookup = |key: &str| -> Option<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| dotfile.as_ref().and_then(|vars| vars.get(key).cloned()))
    };

    let mut config = Config::default();
    if let Some(region_id) = lookup(REGION_ID_ENV) {
        config.region_id = region_id;
    }
    if let Some(endpoint) = lookup(ENDPOINT_ENV) {
        config.endpoint = endpoint;
    }
    if let Some(timeout) = lookup(TIMEOUT_MS_ENV).and_then(|v| v.parse().ok()) {
        config.timeout_ms = timeout;
    }
    config
}

/// Parse the dotfile into a key/value map without touching the process
/// environment.
fn read_dotfile(env_file: Option<&Path>) -> Option<std::collections::HashMap<String, String>> {
    let path = match env_file {
        Some(path) => path.to_path_buf(),
        None => find_dotenv()?,
    };
    let iter = dotenvy::from_path_iter(&path).ok()?;
    let mut vars = std::collections::HashMap::new();
    for (key, value) in iter.flatten() {
        vars.insert(key, value);
    }
    Some(vars)
}

/// Search for a `.env` file starting at the working directory and walking up.
fn find_dotenv() -> Option<PathBuf> {
    let mut dir = env::current_dir().ok()?;
    loop {
        let candidate = dir.join(".env");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
#[path = "config.test.rs"]
mod tests;
